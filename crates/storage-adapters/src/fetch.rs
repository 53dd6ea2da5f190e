//! # HTTP Page Fetcher
//!
//! One GET per submission, no retry. The whole exchange, body included, is
//! bounded by the client timeout.

use std::time::Duration;

use async_trait::async_trait;
use domains::{FetchError, PageFetcher};
use reqwest::Client;
use tracing::{debug, warn};

pub const DEFAULT_USER_AGENT: &str = concat!("rusty-gallery/", env!("CARGO_PKG_VERSION"));

pub struct HttpPageFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout.as_secs().max(1))
        } else if err.is_decode() || err.is_body() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "remote page returned non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        debug!(%url, bytes = body.len(), "remote page fetched");
        Ok(body)
    }
}
