/// File-backed record store: one JSONL file per (exchange, trade date) partition
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::store::RecordStore;
use crate::error::{IngestError, Result};
use crate::types::{CanonicalBondRecord, Exchange, TradeDate};

pub struct JsonlRecordStore {
    root: PathBuf,
}

impl JsonlRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonlRecordStore { root: root.into() }
    }

    /// `{root}/{exchange}/{YYYY-MM-DD}.jsonl`
    pub fn partition_path(&self, date: TradeDate, exchange: Exchange) -> PathBuf {
        self.root
            .join(exchange.as_str().to_lowercase())
            .join(format!("{}.jsonl", date.storage_key()))
    }

    /// Read back a partition; a missing file is an empty partition
    pub async fn load(
        &self,
        date: TradeDate,
        exchange: Exchange,
    ) -> Result<Vec<CanonicalBondRecord>> {
        let path = self.partition_path(date, exchange);
        if !fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path).await?);
        let mut lines = reader.lines();
        let mut records = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str::<CanonicalBondRecord>(&line)?);
        }

        Ok(records)
    }
}

#[async_trait]
impl RecordStore for JsonlRecordStore {
    async fn delete(&self, date: TradeDate, exchange: Exchange) -> Result<u64> {
        let path = self.partition_path(date, exchange);
        if !fs::try_exists(&path).await? {
            return Ok(0);
        }

        // Line count; records are not parsed so a corrupt partition is still replaceable
        let existing = fs::read_to_string(&path)
            .await?
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count() as u64;
        fs::remove_file(&path).await?;

        debug!("Removed {} records from {}", existing, path.display());
        Ok(existing)
    }

    async fn insert_batch(&self, records: &[CanonicalBondRecord]) -> Result<()> {
        let first = match records.first() {
            Some(r) => r,
            None => return Ok(()),
        };
        if records
            .iter()
            .any(|r| r.trade_date != first.trade_date || r.exchange != first.exchange)
        {
            return Err(IngestError::StorageError(
                "Batch spans more than one partition".to_string(),
            ));
        }

        let path = self.partition_path(first.trade_date, first.exchange);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut body = String::new();
        if fs::try_exists(&path).await? {
            body = fs::read_to_string(&path).await?;
            if !body.is_empty() && !body.ends_with('\n') {
                body.push('\n');
            }
        }
        for record in records {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        write_atomically(&path, body.as_bytes()).await?;
        debug!("Wrote {} records to {}", records.len(), path.display());

        Ok(())
    }
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("jsonl.tmp");

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, path).await?;
    Ok(())
}
