/// Historical backfill over a date range
/// Usage: cargo run --release --bin backfill -- --from 2026-01-01 --to 2026-01-31
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use bondsync::{
    app::{build_pipeline, config_path, init_logging},
    config::load_config,
    time::trade_dates_between,
    Exchange,
};

#[derive(Parser, Debug)]
#[command(name = "backfill", about = "Re-ingest corporate bond trades for a range of dates")]
struct Cli {
    /// First date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,

    /// Last date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,

    /// Restrict to one exchange (BSE or NSE)
    #[arg(long, value_parser = parse_exchange)]
    source: Option<Exchange>,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    dry_run: bool,
}

fn parse_exchange(s: &str) -> std::result::Result<Exchange, String> {
    Exchange::from_str(s).ok_or_else(|| format!("unknown exchange '{}', expected BSE or NSE", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = config_path(cli.config);
    let config = load_config(&path).with_context(|| format!("loading {}", path.display()))?;
    init_logging(&config.log_level, false);

    if cli.from > cli.to {
        bail!("--from {} is after --to {}", cli.from, cli.to);
    }

    let dates = trade_dates_between(cli.from, cli.to);
    if dates.is_empty() {
        bail!("No weekdays between {} and {}", cli.from, cli.to);
    }

    let pipeline = build_pipeline(&config, cli.dry_run)?;
    if let Some(source) = cli.source {
        if !pipeline.sources().contains(&source) {
            bail!("{} is disabled in {}", source, path.display());
        }
    }

    info!("📥 Backfill: {} trade dates from {} to {}", dates.len(), cli.from, cli.to);
    let summary = pipeline.run_backfill(dates, cli.source).await;

    if let Some(reason) = &summary.aborted {
        return Err(anyhow!("backfill aborted: {}", reason));
    }
    if !summary.is_success() {
        bail!("{} source syncs failed", summary.failure_count());
    }

    Ok(())
}
