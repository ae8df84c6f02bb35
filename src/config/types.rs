use serde::Deserialize;

/// Account search result, first page. The site numbers this page 2.
pub const DEFAULT_ACCOUNT_START_URL: &str = "https://ec.europa.eu/clima/ets/oha.do?form=oha&languageCode=fr&accountHolder=&installationIdentifier=&installationName=&permitIdentifier=&mainActivityType=-1&searchType=oha&currentSortSettings=accountTypeCode+ASC&backList=%3CBack&resultList.currentPageNumber=2";

/// Account search result template; `resultList.currentPageNumber` is rewritten per page.
pub const DEFAULT_ACCOUNT_PAGE_URL: &str = "https://ec.europa.eu/clima/ets/oha.do?form=oha&languageCode=fr&accountHolder=&installationIdentifier=&installationName=&permitIdentifier=&mainActivityType=-1&searchType=oha&currentSortSettings=accountTypeCode+ASC&backList=%3CBack&resultList.currentPageNumber=3";

/// Transaction search, first page. Read by the update gate and the planner.
pub const DEFAULT_TRANSACTION_PROBE_URL: &str = "https://ec.europa.eu/clima/ets/transaction.do?endDate=&suppTransactionType=-1&transactionStatus=4&originatingAccountType=-1&originatingAccountIdentifier=&originatingAccountHolder=&languageCode=en&destinationAccountIdentifier=&transactionID=&transactionType=-1&destinationAccountType=-1&search=Search&toCompletionDate=&originatingRegistry=-1&destinationAccountHolder=&fromCompletionDate=&destinationRegistry=-1&startDate=&TITLESORT-currentSortSettings-transactionDate-H=A&currentSortSettings=transactionDate%20ASC";

/// Transaction search result template; `resultList.currentPageNumber` is rewritten per page.
pub const DEFAULT_TRANSACTION_PAGE_URL: &str = "https://ec.europa.eu/clima/ets/transaction.do?languageCode=fr&startDate=&endDate=&transactionStatus=4&fromCompletionDate=&toCompletionDate=&transactionID=&transactionType=-1&suppTransactionType=-1&originatingRegistry=-1&destinationRegistry=-1&originatingAccountType=-1&destinationAccountType=-1&originatingAccountIdentifier=&destinationAccountIdentifier=&originatingAccountHolder=&destinationAccountHolder=&currentSortSettings=&backList=%3CBack&resultList.currentPageNumber=2";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Result pages fetched and extracted concurrently
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: u32,

    /// Detail pages fetched concurrently per result page
    #[serde(rename = "max-concurrent-details")]
    pub max_concurrent_details: u32,

    /// Hard cap on in-flight HTTP requests across the whole run
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Re-fetches allowed for a page whose content did not render.
    /// Absent means retry until the page renders.
    ///
    /// The update gate records the new baseline before the transaction pages
    /// are fetched, so a page abandoned under this limit is not fetched again
    /// until the registry changes or `force-refresh-days` pass. Run with
    /// `--force` to recover it sooner.
    #[serde(rename = "max-page-retries", default)]
    pub max_page_retries: Option<u32>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Age after which the update gate forces a crawl even if the site looks unchanged
    #[serde(rename = "force-refresh-days", default = "default_refresh_days")]
    pub force_refresh_days: u32,
}

fn default_timeout() -> u64 {
    30
}

fn default_refresh_days() -> u32 {
    90
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Registry entry points
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(rename = "account-start-url", default = "default_account_start")]
    pub account_start_url: String,

    #[serde(rename = "account-page-url", default = "default_account_page")]
    pub account_page_url: String,

    #[serde(rename = "transaction-probe-url", default = "default_transaction_probe")]
    pub transaction_probe_url: String,

    #[serde(rename = "transaction-page-url", default = "default_transaction_page")]
    pub transaction_page_url: String,
}

fn default_account_start() -> String {
    DEFAULT_ACCOUNT_START_URL.to_string()
}

fn default_account_page() -> String {
    DEFAULT_ACCOUNT_PAGE_URL.to_string()
}

fn default_transaction_probe() -> String {
    DEFAULT_TRANSACTION_PROBE_URL.to_string()
}

fn default_transaction_page() -> String {
    DEFAULT_TRANSACTION_PAGE_URL.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            account_start_url: default_account_start(),
            account_page_url: default_account_page(),
            transaction_probe_url: default_transaction_probe(),
            transaction_page_url: default_transaction_page(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// CSV file receiving account/compliance records
    #[serde(rename = "account-csv-path")]
    pub account_csv_path: String,

    /// CSV file receiving transaction records
    #[serde(rename = "transaction-csv-path")]
    pub transaction_csv_path: String,

    /// Freshness-check file read and rewritten by the update gate
    #[serde(rename = "state-path")]
    pub state_path: String,

    /// Optional SQLite database mirroring every emitted record
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,

    /// Optional markdown run summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}
