/// Daily bond trade ingestion
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use bondsync::{
    app::{build_pipeline, config_path, init_logging},
    config::{load_config, market_timezone},
    time::{recent_trade_dates, resolve_trade_date},
    TradeDate,
};

#[derive(Parser, Debug)]
#[command(name = "bondsync", about = "Fetch and store the latest corporate bond trades")]
struct Cli {
    /// Configuration file (defaults to $CONFIG_PATH, then config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep records in memory and log the summary instead of notifying
    #[arg(long)]
    dry_run: bool,

    /// Fetch this date (YYYY-MM-DD) instead of the resolved one
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = config_path(cli.config);
    let config = load_config(&path).with_context(|| format!("loading {}", path.display()))?;
    init_logging(&config.log_level, cli.json_logs);

    let dates = match cli.date {
        Some(date) => match TradeDate::new(date) {
            Some(d) => vec![d],
            None => bail!("{} falls on a weekend; no session to fetch", date),
        },
        None => {
            let tz = market_timezone(&config)?;
            let anchor = resolve_trade_date(Utc::now(), &tz, config.schedule.cutoff_hour);
            recent_trade_dates(anchor, config.schedule.daily_lookback_days)
        }
    };

    info!("📅 Trade dates: {:?}", dates.iter().map(|d| d.to_string()).collect::<Vec<_>>());

    let pipeline = build_pipeline(&config, cli.dry_run)?;
    let summary = pipeline.run_daily(dates).await;

    if !summary.is_success() {
        bail!("{} source syncs failed (run {})", summary.failure_count(), summary.run_id);
    }

    Ok(())
}
