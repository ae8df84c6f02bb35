//! Retry on unrendered pages
//!
//! The registry occasionally answers with a page that lacks its result
//! content. Such a page is recognised by the absence of the page-count
//! control and is fetched again from the same task.

use crate::crawler::{Document, PageFetcher, PageTask};
use url::Url;

/// How many times an unrendered page is fetched again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry until the page renders
    Unbounded,
    /// Give up after this many retries
    Bounded(u32),
}

impl RetryPolicy {
    /// Policy for an optional configured retry limit
    pub fn from_limit(limit: Option<u32>) -> Self {
        match limit {
            Some(max) => Self::Bounded(max),
            None => Self::Unbounded,
        }
    }

    /// Whether another retry is allowed after `retries` retries
    pub fn allows(&self, retries: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Bounded(max) => retries < *max,
        }
    }
}

/// A result page with its content present
pub struct RenderedPage {
    /// URL after redirects, used to resolve relative links
    pub final_url: Url,
    pub document: Document,
}

/// Result of fetching one page task under a retry policy
pub struct RetryOutcome {
    /// None when the policy gave up before the page rendered
    pub page: Option<RenderedPage>,
    /// Fetches beyond the first one
    pub retries: u32,
}

/// Fetches a task's page until its indicator control is present
///
/// Fetch errors count as unrendered pages. Each retry re-issues the same URL
/// for the same logical page, with no delay.
pub async fn fetch_rendered<F: PageFetcher>(
    fetcher: &F,
    task: &PageTask,
    policy: RetryPolicy,
) -> RetryOutcome {
    let selector = task.report_kind.indicator_selector();
    let attr = task.report_kind.indicator_attr();
    let mut retries = 0;

    loop {
        match fetcher.fetch(&task.url).await {
            Ok(fetched) => {
                let document = Document::parse(&fetched.body);
                if document.attr(selector, attr).is_some() {
                    return RetryOutcome {
                        page: Some(RenderedPage {
                            final_url: fetched.final_url,
                            document,
                        }),
                        retries,
                    };
                }
                tracing::warn!("Page content is None for {}, retrying...", task.url);
            }
            Err(e) => {
                tracing::warn!("Fetch failed for {} ({}), retrying...", task.url, e);
            }
        }

        if !policy.allows(retries) {
            tracing::error!(
                "Giving up on {} page {} after {} retries",
                task.report_kind,
                task.page_index,
                retries
            );
            return RetryOutcome {
                page: None,
                retries,
            };
        }

        retries += 1;
    }
}
