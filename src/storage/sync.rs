/// Delete-then-insert synchronization of one (trade_date, exchange) partition
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::store::RecordStore;
use crate::error::{IngestError, Result};
use crate::types::{CanonicalBondRecord, Exchange, TradeDate};

/// Row counts of one replace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub deleted: u64,
    pub inserted: u64,
}

pub struct SyncWriter {
    store: Arc<dyn RecordStore>,
}

impl SyncWriter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        SyncWriter { store }
    }

    /// Make the partition hold exactly `records`.
    ///
    /// The store sees one `delete` then at most one `insert_batch`; an empty
    /// batch leaves the partition empty. Re-running for the same key is safe.
    pub async fn replace(
        &self,
        date: TradeDate,
        exchange: Exchange,
        records: Vec<CanonicalBondRecord>,
    ) -> Result<SyncStats> {
        if let Some(stray) = records
            .iter()
            .find(|r| r.trade_date != date || r.exchange != exchange)
        {
            return Err(IngestError::StorageError(format!(
                "Record for {} {} does not belong to partition {} {}",
                stray.trade_date, stray.exchange, date, exchange
            )));
        }

        let deleted = self
            .store
            .delete(date, exchange)
            .await
            .map_err(|e| storage_error("delete", date, exchange, e))?;

        if !records.is_empty() {
            self.store
                .insert_batch(&records)
                .await
                .map_err(|e| storage_error("insert", date, exchange, e))?;
        } else {
            debug!("Empty batch for {} {}, insert skipped", date, exchange);
        }

        let stats = SyncStats {
            deleted,
            inserted: records.len() as u64,
        };
        info!(
            "💾 {} {}: replaced {} rows with {}",
            exchange, date, stats.deleted, stats.inserted
        );

        Ok(stats)
    }
}

fn storage_error(
    step: &str,
    date: TradeDate,
    exchange: Exchange,
    cause: IngestError,
) -> IngestError {
    match cause {
        IngestError::StorageError(msg) => {
            IngestError::StorageError(format!("{} failed for {} {}: {}", step, exchange, date, msg))
        }
        other => IngestError::StorageError(format!(
            "{} failed for {} {}: {}",
            step, exchange, date, other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BondFields;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<String>>,
        fail_insert: bool,
    }

    #[async_trait]
    impl RecordStore for RecordingStore {
        async fn delete(&self, date: TradeDate, exchange: Exchange) -> Result<u64> {
            self.calls.lock().unwrap().push(format!("delete {} {}", date, exchange));
            Ok(7)
        }

        async fn insert_batch(&self, records: &[CanonicalBondRecord]) -> Result<()> {
            self.calls.lock().unwrap().push(format!("insert {}", records.len()));
            if self.fail_insert {
                return Err(IngestError::FileError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            Ok(())
        }
    }

    fn date() -> TradeDate {
        TradeDate::parse("2026-01-28").unwrap()
    }

    fn batch(n: usize) -> Vec<CanonicalBondRecord> {
        (0..n)
            .map(|_| BondFields::default().into_record(date(), Exchange::Nse))
            .collect()
    }

    #[tokio::test]
    async fn test_delete_then_single_insert() {
        let store = Arc::new(RecordingStore::default());
        let writer = SyncWriter::new(store.clone());

        let stats = writer.replace(date(), Exchange::Nse, batch(3)).await.unwrap();
        assert_eq!(stats, SyncStats { deleted: 7, inserted: 3 });
        assert_eq!(
            *store.calls.lock().unwrap(),
            vec!["delete 2026-01-28 NSE".to_string(), "insert 3".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_deletes_only() {
        let store = Arc::new(RecordingStore::default());
        let writer = SyncWriter::new(store.clone());

        let stats = writer.replace(date(), Exchange::Nse, Vec::new()).await.unwrap();
        assert_eq!(stats.inserted, 0);
        assert_eq!(store.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_record_rejected_before_delete() {
        let store = Arc::new(RecordingStore::default());
        let writer = SyncWriter::new(store.clone());

        let mut records = batch(1);
        records.push(BondFields::default().into_record(date(), Exchange::Bse));

        let err = writer.replace(date(), Exchange::Nse, records).await.unwrap_err();
        assert!(matches!(err, IngestError::StorageError(_)));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_storage_error() {
        let store = Arc::new(RecordingStore {
            fail_insert: true,
            ..RecordingStore::default()
        });
        let writer = SyncWriter::new(store);

        let err = writer.replace(date(), Exchange::Nse, batch(2)).await.unwrap_err();
        assert!(matches!(err, IngestError::StorageError(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
