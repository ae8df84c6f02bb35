//! Crawler coordinator - report crawl orchestration
//!
//! This module runs one report crawl end to end:
//! - Fetching the report's first page and planning the page tasks
//! - Running the update gate (transactions only)
//! - Fanning out page fetches, and detail fetches under each account page
//! - Feeding completed records to a sink from a single consumer
//! - Building the crawl summary

use crate::config::Config;
use crate::crawler::planner::{plan, RegistryEndpoints};
use crate::crawler::retry::{fetch_rendered, RenderedPage, RetryOutcome, RetryPolicy};
use crate::crawler::scheduler::Scheduler;
use crate::crawler::{Document, HttpFetcher, PageFetcher, PageTask, ReportKind};
use crate::extract::{
    enrich_from_detail, extract_result_rows, extract_transactions, AccountRecord,
    PendingAccount, Record,
};
use crate::output::{CrawlSummary, RecordSink};
use crate::state::{run_gate, CrawlStateStore};
use crate::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};

/// What one page task produced
#[derive(Debug)]
struct PageResult {
    rendered: bool,
    retries: u32,
    rows_seen: usize,
    rows_without_link: usize,
    detail_failures: usize,
    records: Vec<Record>,
}

impl PageResult {
    fn abandoned(retries: u32) -> Self {
        Self {
            rendered: false,
            retries,
            rows_seen: 0,
            rows_without_link: 0,
            detail_failures: 0,
            records: Vec::new(),
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<F: PageFetcher> {
    fetcher: F,
    endpoints: RegistryEndpoints,
    retry: RetryPolicy,
    max_concurrent_pages: usize,
    max_concurrent_details: usize,
    force_refresh_days: u32,
}

impl Coordinator<HttpFetcher> {
    /// Creates a coordinator fetching over HTTP
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config, HttpFetcher::new(config)?)
    }
}

impl<F: PageFetcher> Coordinator<F> {
    /// Creates a coordinator using the given fetcher
    pub fn new(config: &Config, fetcher: F) -> Result<Self> {
        Ok(Self {
            fetcher,
            endpoints: RegistryEndpoints::from_config(&config.registry)?,
            retry: RetryPolicy::from_limit(config.crawler.max_page_retries),
            max_concurrent_pages: config.crawler.max_concurrent_pages.max(1) as usize,
            max_concurrent_details: config.crawler.max_concurrent_details.max(1) as usize,
            force_refresh_days: config.crawler.force_refresh_days,
        })
    }

    /// Crawls the account/compliance report
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl ran; some pages may have been abandoned
    /// * `Err(EtsError)` - The first page could not be fetched or planned,
    ///   or the sink failed
    pub async fn crawl_accounts(&self, sink: &mut dyn RecordSink) -> Result<CrawlSummary> {
        let kind = ReportKind::Account;
        let mut summary = CrawlSummary::new(kind);

        let first = self.fetch_first_page(kind).await?;
        let plan = plan(&first.document, kind, &self.endpoints)?;

        summary.total_pages = plan.total_pages;
        self.run_pages(plan.tasks, Some(first), sink, &mut summary)
            .await?;

        summary.finish();
        summary.log();
        Ok(summary)
    }

    /// Crawls the transaction report, unless the update gate says the
    /// registry has not changed
    ///
    /// The first page serves as the gate probe and as the planning page; its
    /// own rows are not emitted.
    pub async fn crawl_transactions(
        &self,
        sink: &mut dyn RecordSink,
        store: &dyn CrawlStateStore,
        force: bool,
    ) -> Result<CrawlSummary> {
        let kind = ReportKind::Transaction;
        let mut summary = CrawlSummary::new(kind);

        let first = self.fetch_first_page(kind).await?;
        let plan = plan(&first.document, kind, &self.endpoints)?;
        let decision = run_gate(
            store,
            &first.document,
            Utc::now(),
            self.force_refresh_days,
            force,
        )?;
        drop(first);

        summary.gate = Some(decision.reason);
        summary.total_pages = plan.total_pages;

        if decision.proceed {
            self.run_pages(plan.tasks, None, sink, &mut summary).await?;
        }

        summary.finish();
        summary.log();
        Ok(summary)
    }

    /// Fetches a report's first page; any failure here is fatal
    async fn fetch_first_page(&self, kind: ReportKind) -> Result<RenderedPage> {
        let url = self.endpoints.planning_url(kind);
        tracing::info!("Fetching first {} page: {}", kind, url);

        let page = self.fetcher.fetch(url).await?;
        Ok(RenderedPage {
            document: Document::parse(&page.body),
            final_url: page.final_url,
        })
    }

    /// Fans out the page tasks and writes their records as pages complete
    ///
    /// `planning_page` is the already fetched first page; the task for that
    /// URL uses it instead of fetching it again.
    async fn run_pages(
        &self,
        tasks: Vec<PageTask>,
        mut planning_page: Option<RenderedPage>,
        sink: &mut dyn RecordSink,
        summary: &mut CrawlSummary,
    ) -> Result<()> {
        let total = tasks.len();
        summary.pages_planned = total as u64;

        let planning_url = planning_page.as_ref().map(|_| {
            self.endpoints
                .planning_url(summary.report_kind)
                .clone()
        });

        let scheduler = Scheduler::new(tasks);
        let mut pages = stream::iter(scheduler)
            .map(move |task| {
                let prefetched = if planning_url.as_ref() == Some(&task.url) {
                    planning_page.take()
                } else {
                    None
                };
                self.process_page(task, total, prefetched)
            })
            .buffer_unordered(self.max_concurrent_pages);

        while let Some(page) = pages.next().await {
            summary.retries += u64::from(page.retries);

            if !page.rendered {
                summary.pages_abandoned += 1;
                continue;
            }

            summary.pages_completed += 1;
            summary.rows_seen += page.rows_seen as u64;
            summary.rows_without_link += page.rows_without_link as u64;
            summary.detail_failures += page.detail_failures as u64;

            for record in &page.records {
                sink.write_record(summary.report_kind, record)?;
                summary.records_emitted += 1;
            }
        }

        sink.finish(summary.report_kind)?;
        Ok(())
    }

    /// Fetches one result page (with retries) and extracts its records
    async fn process_page(
        &self,
        task: PageTask,
        total: usize,
        prefetched: Option<RenderedPage>,
    ) -> PageResult {
        let outcome = match prefetched {
            Some(page) => RetryOutcome {
                page: Some(page),
                retries: 0,
            },
            None => fetch_rendered(&self.fetcher, &task, self.retry).await,
        };
        let Some(page) = outcome.page else {
            return PageResult::abandoned(outcome.retries);
        };

        let mut result = PageResult {
            rendered: true,
            retries: outcome.retries,
            rows_seen: 0,
            rows_without_link: 0,
            detail_failures: 0,
            records: Vec::new(),
        };

        match task.report_kind {
            ReportKind::Account => {
                let rows = extract_result_rows(&page.document, &page.final_url);
                drop(page);

                result.rows_seen = rows.pending.len() + rows.without_link;
                result.rows_without_link = rows.without_link;

                let enriched: Vec<Option<AccountRecord>> = stream::iter(rows.pending)
                    .map(|pending| self.enrich(pending))
                    .buffered(self.max_concurrent_details)
                    .collect()
                    .await;

                for record in enriched {
                    match record {
                        Some(record) => result.records.push(record),
                        None => result.detail_failures += 1,
                    }
                }
            }
            ReportKind::Transaction => {
                result.records = extract_transactions(&page.document);
                result.rows_seen = result.records.len();
            }
        }

        tracing::info!(
            "Scraped {} page {} of {}: {} records",
            task.report_kind,
            task.page_index,
            total,
            result.records.len()
        );

        result
    }

    /// Completes an account record from its detail page
    ///
    /// A detail page that cannot be fetched drops the record.
    async fn enrich(&self, pending: PendingAccount) -> Option<AccountRecord> {
        let PendingAccount {
            mut record,
            detail_url,
        } = pending;

        match self.fetcher.fetch(&detail_url).await {
            Ok(page) => {
                let document = Document::parse(&page.body);
                enrich_from_detail(&mut record, &document);
                Some(record)
            }
            Err(e) => {
                tracing::warn!("Dropping account, detail page {} failed: {}", detail_url, e);
                None
            }
        }
    }
}
