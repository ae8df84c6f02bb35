//! Statistics generation from the record database
//!
//! This module provides functionality for extracting and displaying
//! per-report statistics from the storage layer.

use crate::crawler::ReportKind;
use crate::storage::{RunRecord, Storage};
use crate::Result;

/// Stored totals of one report
#[derive(Debug, Clone)]
pub struct ReportStatistics {
    pub report_kind: ReportKind,
    /// Number of runs recorded
    pub runs: u64,
    /// Records stored across all runs
    pub records: u64,
    /// Distinct field names across those records
    pub distinct_fields: u64,
    pub latest_run: Option<RunRecord>,
}

/// Stored totals of every report
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub reports: Vec<ReportStatistics>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(EtsError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics> {
    let mut reports = Vec::new();

    for kind in [ReportKind::Account, ReportKind::Transaction] {
        reports.push(ReportStatistics {
            report_kind: kind,
            runs: storage.count_runs(kind)?,
            records: storage.count_records(kind)?,
            distinct_fields: storage.count_distinct_fields(kind)?,
            latest_run: storage.get_latest_run(kind)?,
        });
    }

    Ok(CrawlStatistics { reports })
}

/// Formats statistics for the terminal
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::from("=== Registry Statistics ===\n\n");

    for report in &stats.reports {
        out.push_str(&format!("{}:\n", report.report_kind));
        out.push_str(&format!("  Runs: {}\n", report.runs));
        out.push_str(&format!("  Records stored: {}\n", report.records));
        out.push_str(&format!("  Distinct columns: {}\n", report.distinct_fields));

        match &report.latest_run {
            Some(run) => {
                out.push_str(&format!(
                    "  Latest run: #{} {} ({} records, started {})\n",
                    run.id,
                    run.status.to_db_string(),
                    run.records_emitted,
                    run.started_at
                ));
            }
            None => out.push_str("  Latest run: none\n"),
        }
        out.push('\n');
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    print!("{}", format_statistics(stats));
}
