use crate::config::types::{Config, CrawlerConfig, DirectoryConfig, HeadersConfig, OutputConfig};
use crate::state::PLACEHOLDER_BAND;
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_directory_config(&config.directory)?;
    validate_crawler_config(&config.crawler)?;
    validate_headers_config(&config.headers)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the directory location
fn validate_directory_config(config: &DirectoryConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use HTTP or HTTPS, got '{}'",
            config.base_url
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must not carry a query or fragment, got '{}'",
            config.base_url
        )));
    }

    if !config.detail_path_prefix.starts_with('/') || config.detail_path_prefix.len() < 2 {
        return Err(ConfigError::Validation(format!(
            "detail-path-prefix must be an absolute path prefix like '/p/', got '{}'",
            config.detail_path_prefix
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    // The threshold has to sit above the placeholder band or the band is unreachable
    if config.empty_row_threshold < *PLACEHOLDER_BAND.end() {
        return Err(ConfigError::Validation(format!(
            "empty-row-threshold must be >= {}, got {}",
            PLACEHOLDER_BAND.end(),
            config.empty_row_threshold
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the request header set
fn validate_headers_config(config: &HeadersConfig) -> ConfigResult<()> {
    for (name, value) in [
        ("user-agent", &config.user_agent),
        ("accept", &config.accept),
        ("accept-language", &config.accept_language),
        ("connection", &config.connection),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "header '{}' cannot be empty",
                name
            )));
        }

        if value.chars().any(|c| c.is_control()) {
            return Err(ConfigError::Validation(format!(
                "header '{}' contains control characters",
                name
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.poll_interval_ms < 50 {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms must be >= 50ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    Ok(())
}
