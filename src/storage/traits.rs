//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::crawler::ReportKind;
use crate::extract::Record;
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Record not found: {0}")]
    RecordNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run for one report crawl
    ///
    /// # Arguments
    ///
    /// * `kind` - The report being crawled
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, kind: ReportKind, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run of a report
    fn get_latest_run(&self, kind: ReportKind) -> StorageResult<Option<RunRecord>>;

    /// Marks a run finished with its final status and record count
    fn finish_run(&mut self, run_id: i64, status: RunStatus, records: u64) -> StorageResult<()>;

    // ===== Records =====

    /// Stores one record under a run
    ///
    /// # Returns
    ///
    /// The ID of the stored record
    fn insert_record(&mut self, run_id: i64, kind: ReportKind, record: &Record)
        -> StorageResult<i64>;

    /// Loads a stored record with its fields in their original order
    fn get_record(&self, record_id: i64) -> StorageResult<Record>;

    // ===== Statistics =====

    /// Counts stored records of a report across all runs
    fn count_records(&self, kind: ReportKind) -> StorageResult<u64>;

    /// Counts runs of a report
    fn count_runs(&self, kind: ReportKind) -> StorageResult<u64>;

    /// Counts distinct field names seen on records of a report
    fn count_distinct_fields(&self, kind: ReportKind) -> StorageResult<u64>;
}
