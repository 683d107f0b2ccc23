//! Shared HTTP client for upstream providers
//!
//! Wraps `reqwest` with transient-retry middleware and maps failures onto
//! [`AvwxError`]: anything before a body arrives is `Transport`, a body that
//! does not parse is `Decode`.

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::AvwxError;
use crate::config::UpstreamConfig;

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: ClientWithMiddleware,
}

impl HttpClient {
    pub fn new(config: &UpstreamConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AvwxError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let inner = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { inner })
    }

    /// GET `url` and return the body as text
    pub async fn get_text(&self, url: &str) -> crate::Result<String> {
        debug!(url, "GET");
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| AvwxError::transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AvwxError::transport(format!(
                "{url} answered {status}: {}",
                error_text.chars().take(200).collect::<String>()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AvwxError::transport(format!("failed to read body from {url}: {e}")))
    }

    /// GET `url` and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> crate::Result<T> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|e| AvwxError::decode(format!("unexpected response from {url}: {e}")))
    }
}
