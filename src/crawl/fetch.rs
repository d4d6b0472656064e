// src/crawl/fetch.rs
// =============================================================================
// Downloading pages.
//
// PageFetcher is the seam between the crawler and the network:
// - HttpFetcher is the real implementation (reqwest)
// - tests plug in an in-memory site instead
//
// fetch_with_retry() wraps any fetcher with exponential backoff:
// - transient failures (timeout, connect, read, 429, 5xx) are retried
// - permanent failures (other 4xx, unclassified errors) fail immediately
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;

/// Sends `User-Agent: a11y-guardian/<version>` unless configured otherwise
pub const DEFAULT_USER_AGENT: &str = concat!("a11y-guardian/", env!("CARGO_PKG_VERSION"));

/// Anything that can turn a URL into page text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher with a fixed per-request timeout
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds the HTTP client once; it is reused for every request
    // (connection pooling).
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5)) // Follow up to 5 redirects
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Read(e.to_string()))
    }
}

/// Backoff schedule for transient failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    // Wait before the attempt that follows failed attempt number `attempt`
    // (1-based): initial * multiplier^(attempt - 1), capped at max_backoff.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = secs.min(self.max_backoff.as_secs_f64());
        Duration::try_from_secs_f64(capped.max(0.0)).unwrap_or(self.max_backoff)
    }
}

// Fetches `url`, retrying transient failures according to `policy`.
//
// Returns: the body of the first successful attempt, or the last error
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<String, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match fetcher.fetch(url).await {
            Ok(body) => return Ok(body),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let wait = policy.backoff(attempt);
                debug!(url, attempt, error = %err, ?wait, "transient fetch failure, retrying");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(err) => {
                debug!(url, attempt, error = %err, "fetch failed");
                return Err(err);
            }
        }
    }
}
