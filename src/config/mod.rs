//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ets_registry::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Result pages in flight: {}", config.crawler.max_concurrent_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, RegistryConfig, UserAgentConfig,
    DEFAULT_ACCOUNT_PAGE_URL, DEFAULT_ACCOUNT_START_URL, DEFAULT_TRANSACTION_PAGE_URL,
    DEFAULT_TRANSACTION_PROBE_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
