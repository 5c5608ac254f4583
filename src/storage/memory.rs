/// In-memory record store for dry runs and tests
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::RecordStore;
use crate::error::Result;
use crate::types::{CanonicalBondRecord, Exchange, TradeDate};

#[derive(Default)]
pub struct MemoryRecordStore {
    partitions: RwLock<HashMap<(TradeDate, Exchange), Vec<CanonicalBondRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self, date: TradeDate, exchange: Exchange) -> Vec<CanonicalBondRecord> {
        self.partitions
            .read()
            .await
            .get(&(date, exchange))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn total_count(&self) -> usize {
        self.partitions.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn delete(&self, date: TradeDate, exchange: Exchange) -> Result<u64> {
        let removed = self.partitions.write().await.remove(&(date, exchange));
        Ok(removed.map(|r| r.len() as u64).unwrap_or(0))
    }

    async fn insert_batch(&self, records: &[CanonicalBondRecord]) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        for record in records {
            partitions
                .entry((record.trade_date, record.exchange))
                .or_default()
                .push(record.clone());
        }
        Ok(())
    }
}
