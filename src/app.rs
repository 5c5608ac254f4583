/// Wiring shared by the binaries
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::notify::{
    DiagnosticSink, JsonlDiagnosticSink, LogDiagnosticSink, LogNotifier, Notifier, WebhookNotifier,
};
use crate::pipeline::IngestPipeline;
use crate::sources::{BseDebtClient, HttpTransport, NseBondClient, ReqwestTransport};
use crate::storage::{JsonlRecordStore, MemoryRecordStore, RecordStore};
use crate::types::Config;

/// `--config`, then `CONFIG_PATH`, then `config.toml`
pub fn config_path(cli: Option<PathBuf>) -> PathBuf {
    cli.or_else(|| std::env::var("CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// `RUST_LOG` wins over the configured level
pub fn init_logging(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        eprintln!("Logging was already initialised");
    }
}

/// Diagnostics are only logged on a dry run
pub fn diagnostic_sink(config: &Config, dry_run: bool) -> Arc<dyn DiagnosticSink> {
    if dry_run {
        Arc::new(LogDiagnosticSink)
    } else {
        Arc::new(JsonlDiagnosticSink::new(&config.diagnostics.path))
    }
}

/// Build the pipeline from configuration. A dry run keeps records in memory
/// and only logs the summary and diagnostics.
pub fn build_pipeline(config: &Config, dry_run: bool) -> Result<IngestPipeline> {
    let timeout = Duration::from_secs(config.schedule.request_timeout_sec);

    let store: Arc<dyn RecordStore> = if dry_run {
        info!("🧪 Dry run: records are kept in memory");
        Arc::new(MemoryRecordStore::new())
    } else {
        Arc::new(JsonlRecordStore::new(&config.storage.data_dir))
    };

    let notifier: Arc<dyn Notifier> = match (&config.notify.webhook_url, dry_run) {
        (Some(url), false) => Arc::new(WebhookNotifier::new(url.clone(), timeout)?),
        _ => Arc::new(LogNotifier),
    };

    let diagnostics = diagnostic_sink(config, dry_run);

    let mut pipeline = IngestPipeline::new(store, notifier, diagnostics)
        .with_pacing(Duration::from_millis(config.schedule.pacing_delay_ms));

    if config.bse.enabled {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(timeout, &config.schedule.user_agent)?);
        pipeline = pipeline.with_bse(BseDebtClient::new(transport, &config.bse)?);
    }

    if config.nse.enabled {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(timeout, &config.schedule.user_agent)?);
        pipeline = pipeline.with_nse(NseBondClient::new(transport, &config.nse)?);
    }

    Ok(pipeline)
}
