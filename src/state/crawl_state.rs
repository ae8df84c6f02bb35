//! Persisted freshness baseline for the update gate
//!
//! The baseline is a small plain-text file of four lines:
//!
//! ```text
//! Date from last launch : 2024-03-01 10:11:12.123456
//! Date from last update : 2024-02-01 08:00:00.000000
//!
//! Date from last update of the website : 2024-01-31 17:45:03
//! ```
//!
//! "last update" is the time of the last full crawl; "last launch" is
//! informational and moves on every run.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const LAUNCH_LABEL: &str = "Date from last launch";
const UPDATE_LABEL: &str = "Date from last update";
const WEBSITE_LABEL: &str = "Date from last update of the website";

/// Errors reading or writing the crawl state
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error on state file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed state file: {0}")]
    Malformed(String),
}

/// Result type for crawl state operations
pub type StateResult<T> = Result<T, StateError>;

/// Freshness baseline of the transaction report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlState {
    /// Last time the gate ran, whether or not it crawled
    pub last_launch: Option<DateTime<Utc>>,
    /// Last time a full crawl was started
    pub last_crawl_timestamp: DateTime<Utc>,
    /// Newest transaction date seen on the registry at that crawl
    pub last_seen_transaction_date: String,
}

impl CrawlState {
    /// Baseline for a crawl started at `now`
    pub fn fresh(now: DateTime<Utc>, site_date: impl Into<String>) -> Self {
        Self {
            last_launch: Some(now),
            last_crawl_timestamp: now,
            last_seen_transaction_date: site_date.into(),
        }
    }

    /// Renders the four-line state file
    pub fn to_file_contents(&self) -> String {
        let launch = self.last_launch.unwrap_or(self.last_crawl_timestamp);
        format!(
            "{} : {}\n{} : {}\n\n{} : {}\n",
            LAUNCH_LABEL,
            format_timestamp(&launch),
            UPDATE_LABEL,
            format_timestamp(&self.last_crawl_timestamp),
            WEBSITE_LABEL,
            self.last_seen_transaction_date
        )
    }

    /// Parses a state file
    ///
    /// The last-update and website lines are required. The launch line is
    /// optional.
    pub fn parse(contents: &str) -> StateResult<Self> {
        let mut launch = None;
        let mut update = None;
        let mut website = None;

        for line in contents.lines() {
            let Some((label, value)) = split_labelled(line) else {
                continue;
            };

            // The website label extends the update label, so it goes first
            if label.starts_with(WEBSITE_LABEL) {
                website = Some(value.to_string());
            } else if label.starts_with(UPDATE_LABEL) {
                update = Some(parse_timestamp(value)?);
            } else if label.starts_with(LAUNCH_LABEL) {
                launch = Some(parse_timestamp(value)?);
            }
        }

        let last_crawl_timestamp = update
            .ok_or_else(|| StateError::Malformed(format!("missing `{}` line", UPDATE_LABEL)))?;
        let last_seen_transaction_date = website
            .ok_or_else(|| StateError::Malformed(format!("missing `{}` line", WEBSITE_LABEL)))?;

        Ok(Self {
            last_launch: launch,
            last_crawl_timestamp,
            last_seen_transaction_date,
        })
    }
}

/// Load/save access to the crawl state
pub trait CrawlStateStore {
    /// Reads the state; Ok(None) when no state was ever saved
    fn load(&self) -> StateResult<Option<CrawlState>>;

    /// Replaces the stored state
    fn save(&self, state: &CrawlState) -> StateResult<()>;
}

/// State kept in a plain-text file, replaced atomically on save
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CrawlStateStore for FileStateStore {
    fn load(&self) -> StateResult<Option<CrawlState>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => CrawlState::parse(&contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, state: &CrawlState) -> StateResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, state.to_file_contents()).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        Ok(())
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(value: &str) -> StateResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| StateError::Malformed(format!("bad timestamp `{}`: {}", value, e)))
}

/// Splits `<label> : <value>` at the first colon; labels may carry extra
/// words after the fixed prefix, values may contain colons
fn split_labelled(line: &str) -> Option<(&str, &str)> {
    let (label, value) = line.split_once(':')?;
    Some((label.trim(), value.trim()))
}
