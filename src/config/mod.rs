//! Configuration module for Tradeline
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: [`Config::default`] describes a working setup.
//!
//! # Example
//!
//! ```no_run
//! use tradeline::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tradeline.toml")).unwrap();
//! println!("Listing mode: {}", config.directory.mode);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DirectoryConfig, HeadersConfig, ListingMode, OutputConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
