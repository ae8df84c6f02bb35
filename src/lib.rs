//! ETS Registry: a paginated extractor for the EU ETS public registry
//!
//! This crate crawls the account/compliance and transaction reports of the
//! registry, maps their nested HTML tables into flat records, and hands those
//! records to CSV or SQLite sinks. An update gate on the transaction report
//! skips the full crawl when the source has not changed.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for registry crawls
#[derive(Debug, Error)]
pub enum EtsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Planning failed for {url}: {message}")]
    Planning { url: String, message: String },

    #[error("Crawl state error: {0}")]
    State(#[from] state::StateError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

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

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, EtsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{PageTask, ReportKind};
pub use extract::Record;
pub use state::CrawlState;
