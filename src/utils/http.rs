// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Source of remote documents.
///
/// Every fetch is stateless and independent, so callers may retry or run
/// fetches for different entries concurrently.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a page body as text.
    async fn get_text(&self, url: &str) -> Result<String>;

    /// Fetch a response body as raw bytes.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// [`Fetcher`] backed by `reqwest` with bounded retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Issue a GET and return the response if its status is a success.
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::status(url, status.as_u16()));
        }
        Ok(response)
    }

    async fn get_text_once(&self, url: &str) -> Result<String> {
        Ok(self.get(url).await?.text().await?)
    }

    async fn get_bytes_once(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.get(url).await?.bytes().await?.to_vec())
    }

    /// Wait before attempt number `attempt` (1-based retry count).
    async fn pause(&self, url: &str, attempt: u32, error: &AppError) {
        let delay = self.backoff * attempt;
        log::debug!(
            "Retrying {} in {:?} (attempt {}/{}): {}",
            url,
            delay,
            attempt,
            self.max_retries,
            error
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.get_text_once(url).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    self.pause(url, attempt, &e).await;
                }
                result => return result,
            }
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self.get_bytes_once(url).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    self.pause(url, attempt, &e).await;
                }
                result => return result,
            }
        }
    }
}
