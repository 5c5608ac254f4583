/// Storage seam for canonical bond records
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CanonicalBondRecord, Exchange, TradeDate};

/// The two operations the sync needs from a store. Records are partitioned by
/// (trade_date, exchange).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Remove every record of the partition; returns how many were removed
    async fn delete(&self, date: TradeDate, exchange: Exchange) -> Result<u64>;

    /// Insert a batch. All records share one partition.
    async fn insert_batch(&self, records: &[CanonicalBondRecord]) -> Result<()>;
}
