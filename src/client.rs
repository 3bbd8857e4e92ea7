//! Rate-limited HTTP client for SEC.gov.
//!
//! The SEC's fair access rules cap automated traffic at 10 requests per
//! second. This client enforces that with a token-bucket limiter, retries
//! rate-limit responses (HTTP 429) and transient network failures with
//! jittered exponential backoff, and treats 404 as a first-class "not found"
//! outcome so the locator can skip unavailable years without failing a whole
//! batch.

use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState,
    state::NotKeyed,
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ClientConfig;
use crate::error::{ReportError, Result};

const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

type Governor = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// HTTP client used by the EDGAR filing locator.
#[derive(Debug, Clone)]
pub struct EdgarClient {
    pub(crate) client: reqwest::Client,

    /// Token bucket rate limiter for SEC compliance.
    pub(crate) rate_limiter: Arc<Governor>,

    /// Base URL for EDGAR archives.
    pub(crate) archives_url: String,

    /// Base URL for the EDGAR data API.
    pub(crate) data_url: String,
}

impl EdgarClient {
    /// Creates a client with SEC-compliant defaults and the given user agent.
    ///
    /// The SEC requires a descriptive user agent with contact information,
    /// e.g. `"my_app/1.0 (me@example.com)"`.
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_config(ClientConfig::new(user_agent))
    }

    /// Creates a client with custom configuration (rate limit, timeout, base
    /// URLs). Useful for tests pointing at a local server.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ReportError::ConfigError(format!("Invalid user agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReportError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(config.rate_limit).ok_or_else(|| {
                ReportError::ConfigError("Rate limit must be greater than zero".to_string())
            })?,
        )));

        Ok(EdgarClient {
            client,
            rate_limiter,
            archives_url: config.base_urls.archives,
            data_url: config.base_urls.data,
        })
    }

    /// Exponential backoff with ±20% jitter: `(2^retry × 1000ms) ± 20%`.
    fn calculate_backoff(retry: u32) -> Duration {
        let backoff_ms = INITIAL_BACKOFF_MS * (2_u64.pow(retry));
        let jitter = (backoff_ms as f64 * 0.2 * (fastrand::f64() - 0.5)) as i64;
        Duration::from_millis((backoff_ms as i64 + jitter) as u64)
    }

    /// Fetches binary data (workbook bytes) with rate limiting and retries.
    ///
    /// Retries up to 5 times on 429 and network failures; 404 returns
    /// [`ReportError::NotFound`] immediately.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut retries = 0;

        loop {
            self.rate_limiter.until_ready().await;

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        return Err(ReportError::RequestError(e));
                    }
                    let backoff = Self::calculate_backoff(retries);
                    tracing::warn!(
                        "Request failed for {}: {:?}. Attempt {}/{}. Retrying in {:?}.",
                        url,
                        e,
                        retries + 1,
                        MAX_RETRIES + 1,
                        backoff
                    );
                    sleep(backoff).await;
                    retries += 1;
                    continue;
                }
            };

            match response.status() {
                reqwest::StatusCode::OK => {
                    return response
                        .bytes()
                        .await
                        .map(|b| b.to_vec())
                        .map_err(ReportError::RequestError);
                }
                reqwest::StatusCode::NOT_FOUND => {
                    return Err(ReportError::NotFound);
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    if retries >= MAX_RETRIES {
                        return Err(ReportError::RateLimitExceeded);
                    }
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| Self::calculate_backoff(retries));
                    tracing::warn!(
                        "Rate limit hit (429) for {}. Attempt {}/{}. Waiting {:?} before retry.",
                        url,
                        retries + 1,
                        MAX_RETRIES + 1,
                        retry_after
                    );
                    sleep(retry_after).await;
                    retries += 1;
                    continue;
                }
                status => {
                    return Err(ReportError::InvalidResponse(format!(
                        "Unexpected status code: {} for URL: {}",
                        status, url
                    )));
                }
            }
        }
    }

    /// Fetches a text resource (the submissions JSON) with the same rate
    /// limiting and retry behavior as [`get_bytes`](Self::get_bytes).
    pub async fn get(&self, url: &str) -> Result<String> {
        let bytes = self.get_bytes(url).await?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Returns the base URL for EDGAR archives.
    pub fn archives_url(&self) -> &str {
        &self.archives_url
    }

    /// Returns the base URL for the EDGAR data API.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_backoff() {
        let backoff0 = EdgarClient::calculate_backoff(0);
        let backoff1 = EdgarClient::calculate_backoff(1);
        let backoff2 = EdgarClient::calculate_backoff(2);

        assert!(backoff0 < backoff1);
        assert!(backoff1 < backoff2);

        // ±20% of 1000ms / 2000ms / 4000ms.
        assert!(backoff0.as_millis() >= 800 && backoff0.as_millis() <= 1200);
        assert!(backoff1.as_millis() >= 1600 && backoff1.as_millis() <= 2400);
        assert!(backoff2.as_millis() >= 3200 && backoff2.as_millis() <= 4800);
    }
}
