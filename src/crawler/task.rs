//! Page tasks and report kinds

use std::fmt;
use url::Url;

/// The two paginated registry reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Account holders and their compliance history
    Account,
    /// Unit transfer log
    Transaction,
}

impl ReportKind {
    /// Selector of the control that reports the total page count.
    ///
    /// Its absence on a result page means the page did not render.
    pub fn indicator_selector(&self) -> &'static str {
        match self {
            Self::Account => "td.bgpagecontent input:nth-child(5)",
            Self::Transaction => "input[name='resultList.lastPageNumber']",
        }
    }

    /// Attribute of the indicator control holding the page count
    pub fn indicator_attr(&self) -> &'static str {
        "value"
    }

    /// Name used in logs, summaries and the record store
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "accounts",
            Self::Transaction => "transactions",
        }
    }

    /// Parses a stored report kind name
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "accounts" => Some(Self::Account),
            "transactions" => Some(Self::Transaction),
            _ => None,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One result page to fetch and extract
///
/// `page_index` is the 1-based logical page, independent of the site's own
/// page-number parameter. A retried page is fetched again from the same task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    pub url: Url,
    pub page_index: u32,
    pub report_kind: ReportKind,
    /// Scheduling priority; lower values are fetched first
    pub priority: u32,
}

impl PageTask {
    /// Creates a task whose priority follows its logical page order
    pub fn new(url: Url, page_index: u32, report_kind: ReportKind) -> Self {
        Self {
            url,
            page_index,
            report_kind,
            priority: page_index,
        }
    }

    /// Overrides the scheduling priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}
