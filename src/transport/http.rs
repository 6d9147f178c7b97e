//! HTTP transport over reqwest.

use std::time::Duration;

use tracing::{debug, error, instrument};

use super::Transport;
use crate::protocol::{RawResponse, Request, TransportError};

/// Sends every request as `GET {base_url}/{endpoint}{path}`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL of the game API.
    base_url: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a per-request timeout.
    #[instrument(skip_all, fields(base_url = %base_url))]
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, TransportError> {
        reqwest::Url::parse(&base_url)
            .map_err(|e| TransportError::new(format!("Invalid server URL {}: {}", base_url, e)))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        debug!("HTTP transport ready");
        Ok(Self { base_url, client })
    }

    /// Base URL requests are joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self), fields(kind = %request.kind(), path = %request.path()))]
    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let url = request.url(&self.base_url)?;
        debug!(url = %url, "Sending request");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Request failed");
            TransportError::new(format!("HTTP request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read response body");
            TransportError::new(format!("Failed to read response: {}", e))
        })?;

        debug!(status, body = %body, "Received response");
        Ok(RawResponse::new(status, body))
    }
}
