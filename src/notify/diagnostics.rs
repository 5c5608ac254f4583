/// Structured artifacts for failures that need a human to look at the remote
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::types::{Exchange, TradeDate};
use crate::utils::generate_idempotency_key;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// Stable per (date, exchange, code, run)
    pub id: String,
    pub run_id: Uuid,
    pub trade_date: TradeDate,
    pub exchange: Exchange,
    pub error_code: String,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl DiagnosticRecord {
    pub fn from_error(
        run_id: Uuid,
        date: TradeDate,
        exchange: Exchange,
        err: &IngestError,
    ) -> Self {
        let run = run_id.to_string();
        let key = date.storage_key();
        let id = generate_idempotency_key(&[&key, exchange.as_str(), err.error_code(), &run]);

        DiagnosticRecord {
            id,
            run_id,
            trade_date: date,
            exchange,
            error_code: err.error_code().to_string(),
            message: err.to_string(),
            recorded_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn store(&self, record: &DiagnosticRecord) -> Result<()>;
}

/// Logs diagnostics without persisting them (dry runs)
pub struct LogDiagnosticSink;

#[async_trait]
impl DiagnosticSink for LogDiagnosticSink {
    async fn store(&self, record: &DiagnosticRecord) -> Result<()> {
        warn!(
            "🧾 Diagnostic for {} {} ({}): {}",
            record.exchange, record.trade_date, record.error_code, record.message
        );
        Ok(())
    }
}

/// Append-only JSONL log of diagnostics
pub struct JsonlDiagnosticSink {
    path: PathBuf,
}

impl JsonlDiagnosticSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlDiagnosticSink { path: path.into() }
    }
}

#[async_trait]
impl DiagnosticSink for JsonlDiagnosticSink {
    async fn store(&self, record: &DiagnosticRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let json_line = serde_json::to_string(record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(format!("{}\n", json_line).as_bytes()).await?;
        file.sync_all().await?;

        warn!(
            "🧾 Diagnostic {} written for {} {} ({})",
            record.id.get(..12).unwrap_or(&record.id),
            record.exchange,
            record.trade_date,
            record.error_code
        );
        Ok(())
    }
}
