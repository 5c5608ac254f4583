/// Sequential ingestion over dates and sources
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::summary::{RunMode, RunSummary, SourceOutcome};
use crate::data::{normalize, Classification};
use crate::error::{IngestError, Result};
use crate::notify::{DiagnosticRecord, DiagnosticSink, Notifier};
use crate::sources::{BseDebtClient, NseBondClient};
use crate::storage::{RecordStore, SyncWriter};
use crate::types::{Exchange, TradeDate};

pub struct IngestPipeline {
    bse: Option<BseDebtClient>,
    nse: Option<NseBondClient>,
    writer: SyncWriter,
    notifier: Arc<dyn Notifier>,
    diagnostics: Arc<dyn DiagnosticSink>,
    pacing: Duration,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        IngestPipeline {
            bse: None,
            nse: None,
            writer: SyncWriter::new(store),
            notifier,
            diagnostics,
            pacing: Duration::ZERO,
        }
    }

    pub fn with_bse(mut self, client: BseDebtClient) -> Self {
        self.bse = Some(client);
        self
    }

    pub fn with_nse(mut self, client: NseBondClient) -> Self {
        self.nse = Some(client);
        self
    }

    /// Delay slept between successive dates
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Configured sources, in processing order
    pub fn sources(&self) -> Vec<Exchange> {
        let mut sources = Vec::new();
        if self.bse.is_some() {
            sources.push(Exchange::Bse);
        }
        if self.nse.is_some() {
            sources.push(Exchange::Nse);
        }
        sources
    }

    /// Every (date, source) is attempted; failures are recorded and skipped
    pub async fn run_daily(&self, dates: Vec<TradeDate>) -> RunSummary {
        self.run(RunMode::Daily, dates, None).await
    }

    /// Stops at the first hard failure so history is never silently partial
    pub async fn run_backfill(&self, dates: Vec<TradeDate>, only: Option<Exchange>) -> RunSummary {
        self.run(RunMode::Backfill, dates, only).await
    }

    async fn run(
        &self,
        mode: RunMode,
        dates: Vec<TradeDate>,
        only: Option<Exchange>,
    ) -> RunSummary {
        let sources: Vec<Exchange> = self
            .sources()
            .into_iter()
            .filter(|s| only.map_or(true, |o| o == *s))
            .collect();

        let mut summary = RunSummary::new(mode, dates.clone());
        info!(
            "🚀 Starting {} run {}: {} dates, sources {:?}",
            mode.as_str(),
            summary.run_id,
            dates.len(),
            sources
        );
        if sources.is_empty() {
            warn!("No sources to process");
        }

        'dates: for (i, date) in dates.iter().copied().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            for &exchange in &sources {
                match self.sync_source(date, exchange).await {
                    Ok(outcome) => summary.record(date, exchange, outcome),
                    Err(err) => {
                        error!("❌ {} {} failed [{}]: {}", exchange, date, err.error_code(), err);

                        if err.needs_diagnostic() {
                            self.write_diagnostic(summary.run_id, date, exchange, &err).await;
                        }
                        summary.record(date, exchange, SourceOutcome::failed(&err));

                        if mode == RunMode::Backfill && err.is_hard_failure() {
                            summary.abort(format!(
                                "{} {} [{}] {}",
                                exchange,
                                date,
                                err.error_code(),
                                err
                            ));
                            warn!("⛔ Backfill aborted at {}", date);
                            break 'dates;
                        }
                    }
                }
            }
        }

        summary.finish();
        info!(
            "🏁 {} run {} finished with {} failures",
            mode.as_str(),
            summary.run_id,
            summary.failure_count()
        );

        if let Err(e) = self.notifier.send(&summary).await {
            warn!("Run summary not delivered [{}]: {}", e.error_code(), e);
        }

        summary
    }

    /// Fetch, normalize and store one (date, source)
    pub async fn sync_source(&self, date: TradeDate, exchange: Exchange) -> Result<SourceOutcome> {
        let classification = match exchange {
            Exchange::Bse => self.bse_client()?.fetch(date).await?,
            Exchange::Nse => self.nse_client()?.fetch(date).await?,
        };

        let text = match classification {
            Classification::DataPayload(text) => text,
            Classification::NoData(reason) => {
                info!("⏭️ {} {}: no data ({})", exchange, date, reason.as_str());
                return Ok(SourceOutcome::NoData { reason });
            }
        };

        let records = normalize(&text, exchange)?
            .into_iter()
            .map(|fields| fields.into_record(date, exchange))
            .collect();

        let stats = self.writer.replace(date, exchange, records).await?;
        Ok(SourceOutcome::Synced(stats))
    }

    fn bse_client(&self) -> Result<&BseDebtClient> {
        self.bse
            .as_ref()
            .ok_or_else(|| IngestError::ConfigError("BSE source is not configured".to_string()))
    }

    fn nse_client(&self) -> Result<&NseBondClient> {
        self.nse
            .as_ref()
            .ok_or_else(|| IngestError::ConfigError("NSE source is not configured".to_string()))
    }

    async fn write_diagnostic(
        &self,
        run_id: Uuid,
        date: TradeDate,
        exchange: Exchange,
        err: &IngestError,
    ) {
        let record = DiagnosticRecord::from_error(run_id, date, exchange, err);
        if let Err(e) = self.diagnostics.store(&record).await {
            error!("Failed to persist diagnostic for {} {}: {}", exchange, date, e);
        }
    }
}
