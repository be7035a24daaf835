//! HTTP capability used by the pipeline. Injected so tests can substitute a fake.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::TransportError;

/// Performs a plain GET and returns the whole body. Shared across concurrent invocations.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Settings for [`ReqwestHttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Bodies larger than this are rejected.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("apibot/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// [`HttpClient`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestHttpClient {
    pub fn new(config: &HttpConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::new(url, e))?;

        // Status is not inspected: error pages are handed to the decoder as-is.
        debug!(url = %url, status = %response.status(), "response received");

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::new(url, e))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(TransportError::new(
                    url,
                    format!("response body exceeds {} bytes", self.max_body_bytes),
                ));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}
