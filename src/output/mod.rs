//! Output module for emitted records and run summaries
//!
//! This module handles:
//! - Writing records to CSV files and to the SQLite store
//! - Fanning one record stream out to several sinks
//! - Generating markdown summaries of a run
//! - Printing statistics from the record store

mod csv_sink;
mod markdown;
mod sqlite_output;
pub mod stats;
mod traits;

pub use csv_sink::{union_columns, ColumnMode, CsvSink};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sqlite_output::SqliteSink;
pub use stats::{load_statistics, print_statistics, CrawlStatistics, ReportStatistics};
pub use traits::{CrawlSummary, OutputError, OutputResult, RecordSink};

use crate::crawler::ReportKind;
use crate::extract::Record;

/// Feeds every record to several sinks, in order
#[derive(Default)]
pub struct MultiSink<'a> {
    sinks: Vec<&'a mut dyn RecordSink>,
}

impl<'a> MultiSink<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Adds a sink
    pub fn push(&mut self, sink: &'a mut dyn RecordSink) {
        self.sinks.push(sink);
    }
}

impl RecordSink for MultiSink<'_> {
    fn write_record(&mut self, kind: ReportKind, record: &Record) -> OutputResult<()> {
        for sink in self.sinks.iter_mut() {
            sink.write_record(kind, record)?;
        }
        Ok(())
    }

    fn finish(&mut self, kind: ReportKind) -> OutputResult<()> {
        for sink in self.sinks.iter_mut() {
            sink.finish(kind)?;
        }
        Ok(())
    }
}
