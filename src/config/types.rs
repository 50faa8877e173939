use crate::state::DEFAULT_EMPTY_ROW_THRESHOLD;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Main configuration structure for Tradeline
///
/// Every section and key is optional; missing values fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub headers: HeadersConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// How business candidates are read from a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    /// Read the summary blocks with CSS selectors; auxiliary fields come from the listing
    Structured,

    /// Scan raw markup for detail links; auxiliary fields come from the detail page
    #[default]
    Resilient,
}

impl FromStr for ListingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" => Ok(Self::Structured),
            "resilient" => Ok(Self::Resilient),
            other => Err(format!(
                "unknown listing mode '{}', expected 'structured' or 'resilient'",
                other
            )),
        }
    }
}

impl fmt::Display for ListingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Resilient => write!(f, "resilient"),
        }
    }
}

/// Where the directory lives and how to read it
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Directory root; listing pages are `{base-url}/{state}?page={n}`
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Listing parser mode
    #[serde(default)]
    pub mode: ListingMode,

    /// Path prefix identifying business detail links in resilient mode
    #[serde(rename = "detail-path-prefix", default = "default_detail_path_prefix")]
    pub detail_path_prefix: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of detail fetches in flight; 1 means strictly sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fixed delay before each detail fetch (milliseconds)
    #[serde(rename = "download-delay-ms", default)]
    pub download_delay_ms: u64,

    /// Consecutive empty rows tolerated before the crawl halts
    #[serde(rename = "empty-row-threshold", default = "default_empty_row_threshold")]
    pub empty_row_threshold: u32,

    /// Optional upper bound on listing pages
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

/// Request headers attached to every fetch
#[derive(Debug, Clone, Deserialize)]
pub struct HeadersConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    #[serde(default = "default_connection")]
    pub connection: String,
}

/// Presentation-side configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// How often the result snapshot is polled (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mode: ListingMode::default(),
            detail_path_prefix: default_detail_path_prefix(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            download_delay_ms: 0,
            empty_row_threshold: default_empty_row_threshold(),
            max_pages: None,
        }
    }
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            connection: default_connection(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://network.procore.com/us".to_string()
}

fn default_detail_path_prefix() -> String {
    "/p/".to_string()
}

fn default_concurrency() -> u32 {
    20
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_empty_row_threshold() -> u32 {
    DEFAULT_EMPTY_ROW_THRESHOLD
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.5".to_string()
}

fn default_connection() -> String {
    "keep-alive".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}
