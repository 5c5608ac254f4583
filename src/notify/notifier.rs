/// Operator notification of run outcomes
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{error, info};

use crate::error::{IngestError, Result};
use crate::pipeline::RunSummary;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, summary: &RunSummary) -> Result<()>;
}

/// Writes the summary to the log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, summary: &RunSummary) -> Result<()> {
        let text = summary.render_text();
        if summary.is_success() {
            info!("📣 {}", text);
        } else {
            error!("📣 {}", text);
        }
        Ok(())
    }
}

/// Posts `{"text": ...}` to a chat webhook
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                IngestError::ConfigError(format!("Failed to build webhook client: {}", e))
            })?;

        Ok(WebhookNotifier {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, summary: &RunSummary) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": summary.render_text() }))
            .send()
            .await
            .map_err(|e| {
                IngestError::NotificationFailed(format!("Webhook request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::NotificationFailed(format!(
                "Webhook returned HTTP {}",
                status
            )));
        }

        info!("📣 Run summary posted to webhook");
        Ok(())
    }
}
