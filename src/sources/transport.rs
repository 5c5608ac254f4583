/// HTTP transport used by the exchange clients
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::SET_COOKIE;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use crate::error::{IngestError, Result};

/// A fully read response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Set-Cookie` header values, in arrival order
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request seam between the clients and the network.
///
/// Transport failures surface as `UpstreamUnavailable`; status handling is
/// left to the caller.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse>;

    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        form: &[(String, String)],
    ) -> Result<HttpResponse>;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| IngestError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ReqwestTransport { client })
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<HttpResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| {
                IngestError::UpstreamUnavailable(format!("Request to {} failed: {}", url, e))
            })?;

        read_response(response, url).await
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        debug!("GET {}", url);
        let request = with_headers(self.client.get(url), headers);
        self.send(request, url).await
    }

    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        form: &[(String, String)],
    ) -> Result<HttpResponse> {
        debug!("POST {} ({} form fields)", url, form.len());
        let request = with_headers(self.client.post(url), headers).form(form);
        self.send(request, url).await
    }
}

fn with_headers(request: RequestBuilder, headers: &[(String, String)]) -> RequestBuilder {
    headers
        .iter()
        .fold(request, |req, (name, value)| req.header(name.as_str(), value.as_str()))
}

async fn read_response(response: Response, url: &str) -> Result<HttpResponse> {
    let status = response.status().as_u16();
    let set_cookies = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();

    let body = response
        .text()
        .await
        .map_err(|e| {
            IngestError::UpstreamUnavailable(format!("Reading body from {} failed: {}", url, e))
        })?;

    debug!("{} -> {} ({} bytes)", url, status, body.len());

    Ok(HttpResponse {
        status,
        set_cookies,
        body,
    })
}
