/// Direct CSV client for the NSE corporate bond report
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info};

use super::transport::HttpTransport;
use crate::data::{classify, Classification};
use crate::error::{IngestError, Result};
use crate::types::{NseConfig, TradeDate};

/// Turnover is requested in crores and rescaled to lakhs during normalization
pub const REQUESTED_UNIT: &str = "crores";

pub struct NseBondClient {
    transport: Arc<dyn HttpTransport>,
    config: NseConfig,
}

impl NseBondClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &NseConfig) -> Result<Self> {
        Url::parse(&config.url)
            .map_err(|e| IngestError::ConfigError(format!("Invalid nse.url: {}", e)))?;

        Ok(NseBondClient {
            transport,
            config: config.clone(),
        })
    }

    /// Report URL for one date
    pub fn request_url(&self, date: TradeDate) -> Result<String> {
        let date_text = date.format(&self.config.date_format);
        let url = Url::parse_with_params(
            &self.config.url,
            &[
                (self.config.date_param.as_str(), date_text.as_str()),
                (self.config.unit_param.as_str(), REQUESTED_UNIT),
            ],
        )
        .map_err(|e| IngestError::ConfigError(format!("Invalid nse.url: {}", e)))?;

        Ok(url.to_string())
    }

    pub async fn fetch(&self, date: TradeDate) -> Result<Classification> {
        let url = self.request_url(date)?;
        info!("📥 NSE: downloading report for {}", date);

        let headers = vec![("Accept".to_string(), "text/csv,*/*".to_string())];
        let response = self.transport.get(&url, &headers).await?;

        if !response.is_success() {
            return Err(IngestError::UpstreamUnavailable(format!(
                "NSE report returned HTTP {}",
                response.status
            )));
        }

        debug!("NSE: {} bytes for {}", response.body.len(), date);
        Ok(classify(&response.body))
    }
}
