//! HTTP fetcher implementation
//!
//! One client per crawl, built with the configured browser-style header set
//! and timeout. Every fetch is a single attempt: no retries, no redirect
//! bookkeeping beyond what reqwest does by default. Callers decide what a
//! failure means (end of pagination for listings, a skipped candidate for
//! detail pages).

use crate::config::{CrawlerConfig, HeadersConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Network-level failure of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("HTTP error for {url}: {source}")]
    Request { url: String, source: reqwest::Error },
}

impl FetchError {
    /// The URL the failed request was issued for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Connect { url }
            | Self::Body { url, .. }
            | Self::Request { url, .. } => url,
        }
    }
}

/// Builds the HTTP client used for every listing and detail request
///
/// # Arguments
///
/// * `headers` - The fixed header set attached to every request
/// * `crawler` - Supplies the per-request timeout
///
/// # Example
///
/// ```
/// use tradeline::config::{CrawlerConfig, HeadersConfig};
/// use tradeline::crawler::build_http_client;
///
/// let client = build_http_client(&HeadersConfig::default(), &CrawlerConfig::default());
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(
    headers: &HeadersConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .default_headers(default_headers(headers))
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.request_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Converts the configured header set into a header map
///
/// Values that are not valid header text are left out with a warning; the
/// config validator already rejects control characters.
fn default_headers(config: &HeadersConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in [
        (USER_AGENT, &config.user_agent),
        (ACCEPT, &config.accept),
        (ACCEPT_LANGUAGE, &config.accept_language),
        (CONNECTION, &config.connection),
    ] {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => tracing::warn!("Skipping invalid {} header: {}", name, e),
        }
    }

    headers
}

/// Fetches a page and returns its body
///
/// Non-2xx responses, timeouts and connection failures all come back as
/// [`FetchError`]; nothing is retried.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String, FetchError> {
    tracing::trace!("GET {}", url);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect { url }
    } else {
        FetchError::Request { url, source: error }
    }
}
