//! Crawler module for paginated registry reports
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `PageFetcher` trait
//! - HTML document queries
//! - Pagination planning and task ordering
//! - Retry of pages that did not render
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
pub mod parser;
pub mod planner;
pub mod retry;
mod scheduler;
mod task;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, user_agent_string, FetchedPage, HttpFetcher, PageFetcher};
pub use parser::Document;
pub use planner::{plan, read_total_pages, PagePlan, RegistryEndpoints};
pub use retry::{fetch_rendered, RetryOutcome, RetryPolicy};
pub use scheduler::Scheduler;
pub use task::{PageTask, ReportKind};

use crate::config::Config;
use crate::output::{CrawlSummary, RecordSink};
use crate::state::FileStateStore;
use crate::Result;

/// Runs the selected report crawls over HTTP
///
/// Reports run one after the other, in the order given. The transaction
/// report goes through the update gate unless `force` is set.
///
/// # Returns
///
/// * `Ok(Vec<CrawlSummary>)` - One summary per report
/// * `Err(EtsError)` - A report could not be planned, or the sink failed
pub async fn crawl(
    config: &Config,
    reports: &[ReportKind],
    force: bool,
    sink: &mut dyn RecordSink,
) -> Result<Vec<CrawlSummary>> {
    let coordinator = Coordinator::from_config(config)?;
    let store = FileStateStore::new(&config.output.state_path);
    let mut summaries = Vec::with_capacity(reports.len());

    for kind in reports {
        let summary = match kind {
            ReportKind::Account => coordinator.crawl_accounts(sink).await?,
            ReportKind::Transaction => {
                coordinator.crawl_transactions(sink, &store, force).await?
            }
        };
        summaries.push(summary);
    }

    Ok(summaries)
}
