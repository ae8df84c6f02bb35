//! Pagination planning
//!
//! Reads the total page count from the first result page of a report and
//! turns it into the ordered list of page tasks for the fan-out.

use crate::config::RegistryConfig;
use crate::crawler::{Document, PageTask, ReportKind};
use crate::url::{parse_registry_url, with_page_number};
use crate::{EtsError, Result};
use url::Url;

/// Site page number of the second account result page
const ACCOUNT_FIRST_NUMBERED_PAGE: u32 = 3;

/// Site page number of the first transaction page fetched after the probe
const TRANSACTION_FIRST_NUMBERED_PAGE: u32 = 2;

/// Parsed registry entry points
#[derive(Debug, Clone)]
pub struct RegistryEndpoints {
    pub account_start: Url,
    pub account_page: Url,
    pub transaction_probe: Url,
    pub transaction_page: Url,
}

impl RegistryEndpoints {
    /// Parses the configured entry points
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        Ok(Self {
            account_start: parse_registry_url(&config.account_start_url)?,
            account_page: parse_registry_url(&config.account_page_url)?,
            transaction_probe: parse_registry_url(&config.transaction_probe_url)?,
            transaction_page: parse_registry_url(&config.transaction_page_url)?,
        })
    }

    /// URL of the first page of a report, the one used for planning
    pub fn planning_url(&self, kind: ReportKind) -> &Url {
        match kind {
            ReportKind::Account => &self.account_start,
            ReportKind::Transaction => &self.transaction_probe,
        }
    }
}

/// Tasks for one report, in scheduling order
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub report_kind: ReportKind,
    /// Page count reported by the site
    pub total_pages: u32,
    pub tasks: Vec<PageTask>,
}

/// Reads the page count from a report's first page
///
/// An absent or non-numeric control is a planning error: no task can be
/// generated safely from such a page.
pub fn read_total_pages(doc: &Document, kind: ReportKind, url: &Url) -> Result<u32> {
    let raw = doc
        .attr(kind.indicator_selector(), kind.indicator_attr())
        .ok_or_else(|| EtsError::Planning {
            url: url.to_string(),
            message: format!("page count control `{}` not found", kind.indicator_selector()),
        })?;

    raw.trim().parse::<u32>().map_err(|_| EtsError::Planning {
        url: url.to_string(),
        message: format!("page count `{}` is not a number", raw.trim()),
    })
}

/// Plans every page task of a report from its first page
///
/// # Account report
///
/// Logical page 1 is the start URL itself and is scheduled ahead of every
/// other task. Logical pages 2 to `total - 1` are the page template with the
/// site page number starting at 3.
///
/// # Transaction report
///
/// The first page is the update-gate probe and is not fetched again. Site
/// pages 2 to `total + 1` become logical pages 1 to `total`.
///
/// # Example
///
/// ```
/// use ets_registry::config::RegistryConfig;
/// use ets_registry::crawler::{plan, Document, RegistryEndpoints, ReportKind};
///
/// let endpoints = RegistryEndpoints::from_config(&RegistryConfig::default()).unwrap();
/// let first_page = Document::parse(
///     r#"<table><tr><td class="bgpagecontent">
///         <input type="button"><input type="button"><input type="button"><input type="button">
///         <input type="text" value="5">
///     </td></tr></table>"#,
/// );
///
/// let plan = plan(&first_page, ReportKind::Account, &endpoints).unwrap();
/// assert_eq!(plan.tasks.len(), 4);
/// ```
pub fn plan(doc: &Document, kind: ReportKind, endpoints: &RegistryEndpoints) -> Result<PagePlan> {
    let total_pages = read_total_pages(doc, kind, endpoints.planning_url(kind))?;

    let tasks = match kind {
        ReportKind::Account => {
            let mut tasks = vec![PageTask::new(endpoints.account_start.clone(), 1, kind).with_priority(0)];
            for logical in 2..total_pages {
                let site_page = logical - 2 + ACCOUNT_FIRST_NUMBERED_PAGE;
                tasks.push(PageTask::new(
                    with_page_number(&endpoints.account_page, site_page),
                    logical,
                    kind,
                ));
            }
            tasks
        }
        ReportKind::Transaction => (1..=total_pages)
            .map(|logical| {
                let site_page = logical - 1 + TRANSACTION_FIRST_NUMBERED_PAGE;
                PageTask::new(
                    with_page_number(&endpoints.transaction_page, site_page),
                    logical,
                    kind,
                )
            })
            .collect(),
    };

    tracing::info!(
        "Planned {} {} pages ({} reported by the registry)",
        tasks.len(),
        kind,
        total_pages
    );

    Ok(PagePlan {
        report_kind: kind,
        total_pages,
        tasks,
    })
}
