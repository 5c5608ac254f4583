/// Run summary shared across the iterations of one run
use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::data::NoDataReason;
use crate::error::IngestError;
use crate::storage::SyncStats;
use crate::types::{Exchange, TradeDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Daily,
    Backfill,
}

impl RunMode {
    pub fn as_str(&self) -> &str {
        match self {
            RunMode::Daily => "daily",
            RunMode::Backfill => "backfill",
        }
    }
}

/// What happened to one (date, source)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Synced(SyncStats),
    NoData { reason: NoDataReason },
    Failed { code: String, message: String },
}

impl SourceOutcome {
    pub fn failed(err: &IngestError) -> Self {
        SourceOutcome::Failed {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeEntry {
    pub date: TradeDate,
    pub exchange: Exchange,
    pub outcome: SourceOutcome,
}

/// Per-source counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub synced: u32,
    pub no_data: u32,
    pub failed: u32,
    pub inserted: u64,
    /// Rows removed by the delete half of each replace
    pub deleted: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dates: Vec<TradeDate>,
    pub sources: BTreeMap<Exchange, SourceReport>,
    pub entries: Vec<OutcomeEntry>,
    pub aborted: Option<String>,
}

impl RunSummary {
    pub fn new(mode: RunMode, dates: Vec<TradeDate>) -> Self {
        RunSummary {
            run_id: Uuid::new_v4(),
            mode,
            started_at: Utc::now(),
            finished_at: None,
            dates,
            sources: BTreeMap::new(),
            entries: Vec::new(),
            aborted: None,
        }
    }

    pub fn record(&mut self, date: TradeDate, exchange: Exchange, outcome: SourceOutcome) {
        let report = self.sources.entry(exchange).or_default();
        match &outcome {
            SourceOutcome::Synced(stats) => {
                report.synced += 1;
                report.inserted += stats.inserted;
                report.deleted += stats.deleted;
            }
            SourceOutcome::NoData { .. } => report.no_data += 1,
            SourceOutcome::Failed { code, message } => {
                report.failed += 1;
                report.errors.push(format!("{} [{}] {}", date, code, message));
            }
        }

        self.entries.push(OutcomeEntry {
            date,
            exchange,
            outcome,
        });
    }

    pub fn abort(&mut self, reason: String) {
        self.aborted = Some(reason);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn failure_count(&self) -> u32 {
        self.sources.values().map(|r| r.failed).sum()
    }

    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.failure_count() == 0
    }

    /// Plain-text report for the operator channel
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let status = if self.is_success() { "✅" } else { "❌" };

        let span = match (self.dates.first(), self.dates.last()) {
            (Some(first), Some(last)) if first != last => format!("{} → {}", first, last),
            (Some(first), _) => first.to_string(),
            _ => "no dates".to_string(),
        };

        let _ = writeln!(
            out,
            "{} Bond sync ({}) {} [run {}]",
            status,
            self.mode.as_str(),
            span,
            self.run_id
        );

        for (exchange, report) in &self.sources {
            let _ = writeln!(
                out,
                "{}: {} synced, {} no data, {} failed | {} rows inserted, {} rows cleaned up",
                exchange,
                report.synced,
                report.no_data,
                report.failed,
                report.inserted,
                report.deleted
            );
            for error in &report.errors {
                let _ = writeln!(out, "  • {}", error);
            }
        }

        if let Some(reason) = &self.aborted {
            let _ = writeln!(out, "Backfill aborted: {}", reason);
        }

        out.trim_end().to_string()
    }
}
