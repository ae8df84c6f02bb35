//! SQLite-based record sink
//!
//! Mirrors every emitted record into the storage backend, under one run per
//! report crawl.

use crate::crawler::ReportKind;
use crate::extract::Record;
use crate::output::traits::{CrawlSummary, OutputResult, RecordSink};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use std::collections::HashMap;

/// SQLite-based record sink
pub struct SqliteSink {
    storage: SqliteStorage,
    config_hash: String,
    open_runs: HashMap<ReportKind, i64>,
}

impl SqliteSink {
    /// Creates a new SQLite sink
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to use
    /// * `config_hash` - Hash of the configuration, recorded on each run
    pub fn new(storage: SqliteStorage, config_hash: impl Into<String>) -> Self {
        Self {
            storage,
            config_hash: config_hash.into(),
            open_runs: HashMap::new(),
        }
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Run of the given report, created on first use
    fn run_id(&mut self, kind: ReportKind) -> OutputResult<i64> {
        if let Some(run_id) = self.open_runs.get(&kind) {
            return Ok(*run_id);
        }

        let run_id = self.storage.create_run(kind, &self.config_hash)?;
        tracing::debug!("Started {} run {}", kind, run_id);
        self.open_runs.insert(kind, run_id);
        Ok(run_id)
    }

    /// Closes the run of a finished report crawl
    pub fn close_run(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        let run_id = self.run_id(summary.report_kind)?;
        let status = if summary.skipped() {
            RunStatus::Skipped
        } else {
            RunStatus::Completed
        };

        self.storage
            .finish_run(run_id, status, summary.records_emitted)?;
        self.open_runs.remove(&summary.report_kind);
        Ok(())
    }

    /// Marks every run still open as failed
    pub fn fail_open_runs(&mut self) -> OutputResult<()> {
        for (kind, run_id) in self.open_runs.drain() {
            tracing::debug!("Marking {} run {} failed", kind, run_id);
            self.storage.finish_run(run_id, RunStatus::Failed, 0)?;
        }
        Ok(())
    }
}

impl RecordSink for SqliteSink {
    fn write_record(&mut self, kind: ReportKind, record: &Record) -> OutputResult<()> {
        let run_id = self.run_id(kind)?;
        self.storage.insert_record(run_id, kind, record)?;
        Ok(())
    }

    fn finish(&mut self, _kind: ReportKind) -> OutputResult<()> {
        Ok(())
    }
}
