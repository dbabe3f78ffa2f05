use crate::types::{AggregatorError, FetchConfig, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared outbound HTTP client.
///
/// Every request carries the configured timeout. There are no retries: a
/// failed call is reported once and the caller decides what it loses.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET `url` and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.send(url, query).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| AggregatorError::Parse(format!("malformed JSON from {}: {}", url, e)))
    }

    /// GET `url` as text, refusing bodies over the configured size limit.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.send(url, &[]).await?;

        if let Some(content_length) = response.content_length() {
            self.check_size(content_length)?;
        }

        let content = response.text().await?;
        self.check_size(content.len() as u64)?;
        debug!("Fetched {} ({} bytes)", url, content.len());
        Ok(content)
    }

    fn check_size(&self, size_bytes: u64) -> Result<()> {
        let limit_mb = self.config.max_feed_size_mb;
        if size_bytes > limit_mb as u64 * 1024 * 1024 {
            return Err(AggregatorError::FeedTooLarge { size_bytes, limit_mb });
        }
        Ok(())
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let start_time = Instant::now();
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        debug!("GET {} -> {} in {}ms", url, status, start_time.elapsed().as_millis());

        if !status.is_success() {
            return Err(AggregatorError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}
