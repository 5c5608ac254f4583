/// Configuration loading from TOML file
use std::path::Path;

use chrono_tz::Tz;
use reqwest::Url;

use crate::error::{IngestError, Result};
use crate::types::Config;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| IngestError::ConfigError(format!("Failed to read config file: {}", e)))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| IngestError::ConfigError(format!("Failed to parse config: {}", e)))?;

    validate_config(&config)?;

    Ok(config)
}

/// Resolve the configured market zone
pub fn market_timezone(config: &Config) -> Result<Tz> {
    config
        .schedule
        .market_timezone
        .parse::<Tz>()
        .map_err(|e| IngestError::ConfigError(format!("Invalid market_timezone: {}", e)))
}

fn validate_config(config: &Config) -> Result<()> {
    // Schedule
    market_timezone(config)?;

    if config.schedule.cutoff_hour > 23 {
        return Err(IngestError::ConfigError(format!(
            "Invalid cutoff_hour: {}",
            config.schedule.cutoff_hour
        )));
    }

    if config.schedule.daily_lookback_days == 0 {
        return Err(IngestError::ConfigError("daily_lookback_days must be >= 1".to_string()));
    }

    if config.schedule.request_timeout_sec == 0 {
        return Err(IngestError::ConfigError("request_timeout_sec must be > 0".to_string()));
    }

    // Sources
    if !config.bse.enabled && !config.nse.enabled {
        return Err(IngestError::ConfigError("At least one source must be enabled".to_string()));
    }

    if config.bse.enabled {
        validate_url("bse.page_url", &config.bse.page_url)?;
        if config.bse.results_marker_id.trim().is_empty() {
            return Err(IngestError::ConfigError("bse.results_marker_id is empty".to_string()));
        }
        if config.bse.results_table_id.trim().is_empty() {
            return Err(IngestError::ConfigError("bse.results_table_id is empty".to_string()));
        }
    }

    if config.nse.enabled {
        validate_url("nse.url", &config.nse.url)?;
        if config.nse.date_param.is_empty() || config.nse.unit_param.is_empty() {
            return Err(IngestError::ConfigError(
                "nse query parameter names must be set".to_string(),
            ));
        }
        if config.nse.date_format.is_empty() {
            return Err(IngestError::ConfigError("nse.date_format is empty".to_string()));
        }
    }

    // Collaborators
    if config.storage.data_dir.as_os_str().is_empty() {
        return Err(IngestError::ConfigError("storage.data_dir is empty".to_string()));
    }

    if config.diagnostics.path.as_os_str().is_empty() {
        return Err(IngestError::ConfigError("diagnostics.path is empty".to_string()));
    }

    if let Some(webhook) = &config.notify.webhook_url {
        validate_url("notify.webhook_url", webhook)?;
    }

    Ok(())
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| IngestError::ConfigError(format!("Invalid {}: {}", key, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(IngestError::ConfigError(format!(
            "Invalid {}: unsupported scheme '{}'",
            key, other
        ))),
    }
}
