use std::time::Duration;

/// Configuration for the EDGAR-backed filing source.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for HTTP requests (required by SEC.gov; use the
    /// "AppName contact@example.com" format).
    pub user_agent: String,
    /// Rate limit in requests per second.
    pub rate_limit: u32,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Base URLs for the EDGAR services used by the locator.
    pub base_urls: EdgarUrls,
}

/// Base URLs for the EDGAR services used by the locator.
#[derive(Debug, Clone)]
pub struct EdgarUrls {
    /// Base URL for EDGAR archives (filing documents).
    pub archives: String,
    /// Base URL for the EDGAR data API (submissions).
    pub data: String,
}

impl Default for EdgarUrls {
    fn default() -> Self {
        Self {
            archives: "https://www.sec.gov/Archives/edgar".to_string(),
            data: "https://data.sec.gov".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "reportkit/0.1.0".to_string(),
            rate_limit: 10,
            timeout: Duration::from_secs(30),
            base_urls: EdgarUrls::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a config with the given user agent and SEC-compliant defaults
    /// (10 requests per second, 30 second timeout, sec.gov base URLs).
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }
}
