//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a run: one
//! section per report crawl with page, row and record counts.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a run
///
/// # Arguments
///
/// * `summaries` - One summary per report crawled
/// * `config_hash` - Hash of the configuration used
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    summaries: &[CrawlSummary],
    config_hash: &str,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(summaries, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the summaries of a run as markdown
pub fn format_markdown_summary(summaries: &[CrawlSummary], config_hash: &str) -> String {
    let mut md = String::new();

    md.push_str("# ETS Registry Crawl Summary\n\n");
    md.push_str(&format!("- **Config Hash**: {}\n", config_hash));
    md.push_str(&format!("- **Reports**: {}\n\n", summaries.len()));

    for summary in summaries {
        md.push_str(&format!("## Report: {}\n\n", summary.report_kind));
        md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
        if let Some(finished) = summary.finished_at {
            md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
        }
        if let Some(duration) = summary.duration_seconds() {
            md.push_str(&format!(
                "- **Duration**: {} seconds ({:.2} minutes)\n",
                duration,
                duration as f64 / 60.0
            ));
        }
        if let Some(gate) = summary.gate {
            md.push_str(&format!("- **Update Gate**: {}\n", gate.as_str()));
        }
        md.push('\n');

        if summary.skipped() {
            md.push_str("Registry unchanged since the last crawl; nothing fetched.\n\n");
            continue;
        }

        md.push_str("| Metric | Count |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Pages reported | {} |\n", summary.total_pages));
        md.push_str(&format!("| Pages planned | {} |\n", summary.pages_planned));
        md.push_str(&format!("| Pages completed | {} |\n", summary.pages_completed));
        md.push_str(&format!("| Pages abandoned | {} |\n", summary.pages_abandoned));
        md.push_str(&format!("| Retries | {} |\n", summary.retries));
        md.push_str(&format!("| Rows seen | {} |\n", summary.rows_seen));
        md.push_str(&format!(
            "| Rows without detail link | {} |\n",
            summary.rows_without_link
        ));
        md.push_str(&format!(
            "| Detail page failures | {} |\n",
            summary.detail_failures
        ));
        md.push_str(&format!(
            "| Records emitted | {} |\n\n",
            summary.records_emitted
        ));
    }

    md
}
