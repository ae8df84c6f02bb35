//! Output sink traits and types
//!
//! This module defines the trait interface for record sinks and the summary
//! produced by every report crawl.

use crate::crawler::ReportKind;
use crate::extract::Record;
use crate::state::GateReason;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives the records emitted by a crawl
///
/// Records arrive one at a time from a single consumer; a record is only
/// written once it is complete.
pub trait RecordSink {
    /// Writes one record of the given report
    fn write_record(&mut self, kind: ReportKind, record: &Record) -> OutputResult<()>;

    /// Flushes buffered records of the given report
    fn finish(&mut self, kind: ReportKind) -> OutputResult<()>;
}

/// Counters and timings of one report crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub report_kind: ReportKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Page count reported by the registry
    pub total_pages: u32,
    pub pages_planned: u64,
    pub pages_completed: u64,
    /// Pages given up on after exhausting retries
    pub pages_abandoned: u64,
    pub retries: u64,

    /// Result rows read from completed pages
    pub rows_seen: u64,
    /// Account rows dropped for lack of a detail link
    pub rows_without_link: u64,
    /// Account rows dropped because their detail page failed
    pub detail_failures: u64,
    pub records_emitted: u64,

    /// Update gate outcome, transactions only
    pub gate: Option<GateReason>,
}

impl CrawlSummary {
    /// Creates an empty summary for a crawl starting now
    pub fn new(report_kind: ReportKind) -> Self {
        Self {
            report_kind,
            started_at: Utc::now(),
            finished_at: None,
            total_pages: 0,
            pages_planned: 0,
            pages_completed: 0,
            pages_abandoned: 0,
            retries: 0,
            rows_seen: 0,
            rows_without_link: 0,
            detail_failures: 0,
            records_emitted: 0,
            gate: None,
        }
    }

    /// Whether the update gate skipped this crawl
    pub fn skipped(&self) -> bool {
        self.gate == Some(GateReason::Unchanged)
    }

    /// Rows that did not become records
    pub fn rows_dropped(&self) -> u64 {
        self.rows_without_link + self.detail_failures
    }

    /// Wall-clock duration, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Marks the crawl finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Logs the final counters
    pub fn log(&self) {
        if self.skipped() {
            tracing::info!("{}: skipped, registry unchanged", self.report_kind);
            return;
        }

        tracing::info!(
            "{}: {} records from {}/{} pages ({} abandoned, {} retries, {} rows dropped)",
            self.report_kind,
            self.records_emitted,
            self.pages_completed,
            self.pages_planned,
            self.pages_abandoned,
            self.retries,
            self.rows_dropped()
        );
    }
}
