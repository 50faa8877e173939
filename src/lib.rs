//! Tradeline: a business directory harvester
//!
//! This crate walks a paginated business directory state by state, visits
//! every listed business's detail page and collects contact rows, stopping
//! when the directory runs out, when too many consecutive businesses
//! yield nothing, or when asked to.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Tradeline operations
#[derive(Debug, Error)]
pub enum TradelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("A crawl is already running")]
    AlreadyRunning,

    #[error("No crawl has been started")]
    NotStarted,

    #[error("Crawl task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Invalid state code: '{0}'")]
    InvalidStateCode(String),

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Tradeline operations
pub type Result<T> = std::result::Result<T, TradelineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, CrawlObserver, CrawlOutcome, Harvester, StopHandle};
pub use output::{BusinessRecord, Snapshot};
pub use state::StopReason;
