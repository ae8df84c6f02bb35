//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the registry and run full
//! report crawls over HTTP, end to end into the CSV and SQLite sinks.

use ets_registry::config::{Config, CrawlerConfig, OutputConfig, RegistryConfig, UserAgentConfig};
use ets_registry::crawler::{crawl, Coordinator, ReportKind};
use ets_registry::output::{CsvSink, MultiSink, SqliteSink};
use ets_registry::state::{CrawlStateStore, FileStateStore, GateReason};
use ets_registry::storage::{SqliteStorage, Storage};
use ets_registry::EtsError;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing every report at the mock server
fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_pages: 3,
            max_concurrent_details: 2,
            max_concurrent_requests: 4,
            max_page_retries: Some(3),
            request_timeout_secs: 5,
            force_refresh_days: 90,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        registry: RegistryConfig {
            account_start_url: format!(
                "{}/oha.do?form=oha&resultList.currentPageNumber=2",
                base_url
            ),
            account_page_url: format!(
                "{}/oha.do?form=oha&resultList.currentPageNumber=3",
                base_url
            ),
            transaction_probe_url: format!("{}/transaction.do?search=Search", base_url),
            transaction_page_url: format!(
                "{}/transaction.do?resultList.currentPageNumber=2",
                base_url
            ),
        },
        output: OutputConfig {
            account_csv_path: dir.path().join("accounts.csv").display().to_string(),
            transaction_csv_path: dir.path().join("transactions.csv").display().to_string(),
            state_path: dir.path().join("last_update.txt").display().to_string(),
            database_path: None,
            summary_path: None,
        },
    }
}

fn spans(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("<td><span>{}</span></td>", v))
        .collect()
}

fn account_page(total: u32, holder: &str, link: Option<&str>) -> String {
    let base = spans(&[
        "AT",
        "Operator Holding Account",
        holder,
        "1",
        "Plant",
        "FN1",
        "P1",
        "2005-01-01",
        "20",
        "A",
    ]);
    let link = link
        .map(|href| {
            format!(
                r#"<td><table><tr><td></td><td><a href="{}">x</a></td></tr></table></td>"#,
                href
            )
        })
        .unwrap_or_else(|| "<td></td>".to_string());

    format!(
        r#"<html><body>
        <table><tr><td class="bgpagecontent">
            <input><input><input><input><input value="{}">
        </td></tr></table>
        <table id="tblAccountSearchResult">
            <tr><th>h</th></tr><tr><th>h</th></tr>
            <tr>{}{}</tr>
        </table></body></html>"#,
        total, base, link
    )
}

fn detail_page(year: &str, code: &str) -> String {
    format!(
        r#"<html><body>
        <table id="tblChildDetails"><tr><td>
            <table><tr><th>h</th></tr><tr><th>h</th></tr><tr>{}</tr></table>
            <div><table>
                <tr><th>h</th></tr><tr><th>h</th></tr>
                <tr>{}</tr>
            </table></div>
        </td></tr></table>
        </body></html>"#,
        spans(&["1", "Plant", "P1", "2005", "2030", "", "", "", "", "2005", ""]),
        spans(&["EU ETS", year, "10", "9", "9", "9", "9", code])
    )
}

fn transaction_page(total: u32, date: &str, ids: &[&str]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| format!("<tr>{}</tr>", spans(&[id, "10-0", date, "Completed"])))
        .collect();
    format!(
        r#"<html><body>
        <input type="hidden" name="resultList.lastPageNumber" value="{}">
        <table id="tblTransactionSearchResult">
            <tr><th>h</th></tr><tr><th>h</th></tr>
            {}
        </table></body></html>"#,
        total, rows
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_account_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/oha.do"))
        .and(query_param("resultList.currentPageNumber", page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_transactions(server: &MockServer, date: &str, expected_page_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/transaction.do"))
        .and(query_param("search", "Search"))
        .respond_with(html(transaction_page(2, date, &["EU0"])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transaction.do"))
        .and(query_param("resultList.currentPageNumber", "2"))
        .respond_with(html(transaction_page(2, date, &["EU1", "EU2"])))
        .expect(expected_page_fetches)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transaction.do"))
        .and(query_param("resultList.currentPageNumber", "3"))
        .respond_with(html(transaction_page(2, date, &["EU3"])))
        .expect(expected_page_fetches)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_account_crawl_writes_union_csv() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    // The planning fetch doubles as logical page 1
    Mock::given(method("GET"))
        .and(path("/oha.do"))
        .and(query_param("resultList.currentPageNumber", "2"))
        .respond_with(html(account_page(
            4,
            "Holder A",
            Some("/singleAccount.do?accountID=1"),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_account_page(
        &mock_server,
        "3",
        account_page(4, "Holder B", Some("/singleAccount.do?accountID=2")),
    )
    .await;
    mount_account_page(&mock_server, "4", account_page(4, "Holder C", None)).await;

    Mock::given(method("GET"))
        .and(path("/singleAccount.do"))
        .and(query_param("accountID", "1"))
        .respond_with(html(detail_page("2021", "A")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/singleAccount.do"))
        .and(query_param("accountID", "2"))
        .respond_with(html(detail_page("2022", "B")))
        .mount(&mock_server)
        .await;

    let mut accounts = CsvSink::for_accounts(&config.output.account_csv_path);
    let summaries = crawl(&config, &[ReportKind::Account], false, &mut accounts)
        .await
        .unwrap();

    let summary = &summaries[0];
    assert_eq!(summary.pages_planned, 3);
    assert_eq!(summary.pages_completed, 3);
    assert_eq!(summary.rows_without_link, 1);
    assert_eq!(summary.records_emitted, 2);

    let mut reader = csv::Reader::from_path(&config.output.account_csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert!(headers
        .iter()
        .any(|h| h == "EU_Compliance_2021_Compliance_Code"));
    assert!(headers
        .iter()
        .any(|h| h == "EU_Compliance_2022_Compliance_Code"));

    let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);

    let holder = headers
        .iter()
        .position(|h| h == "Account_Holder_Name")
        .unwrap();
    let mut holders: Vec<_> = rows.iter().map(|r| r[holder].to_string()).collect();
    holders.sort();
    assert_eq!(holders, vec!["Holder A", "Holder B"]);
}

#[tokio::test]
async fn test_transaction_crawl_then_gated_rerun() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    mount_transactions(&mock_server, "2024-05-31 09:00:00", 1).await;

    let mut transactions = CsvSink::for_transactions(&config.output.transaction_csv_path);
    let first = crawl(&config, &[ReportKind::Transaction], false, &mut transactions)
        .await
        .unwrap();

    assert_eq!(first[0].gate, Some(GateReason::NoBaseline));
    assert_eq!(first[0].records_emitted, 3);

    let contents = std::fs::read_to_string(&config.output.transaction_csv_path).unwrap();
    assert_eq!(contents.lines().count(), 4);
    assert!(!contents.contains("EU0"));

    let store = FileStateStore::new(&config.output.state_path);
    let state = store.load().unwrap().unwrap();
    assert_eq!(state.last_seen_transaction_date, "2024-05-31 09:00:00");

    let mut rerun = CsvSink::for_transactions(&config.output.transaction_csv_path);
    let second = crawl(&config, &[ReportKind::Transaction], false, &mut rerun)
        .await
        .unwrap();

    assert!(second[0].skipped());
    assert_eq!(second[0].records_emitted, 0);

    let unchanged = std::fs::read_to_string(&config.output.transaction_csv_path).unwrap();
    assert_eq!(unchanged, contents);
}

#[tokio::test]
async fn test_forced_crawl_bypasses_gate() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    mount_transactions(&mock_server, "2024-05-31 09:00:00", 2).await;

    let mut transactions = CsvSink::for_transactions(&config.output.transaction_csv_path);
    crawl(&config, &[ReportKind::Transaction], false, &mut transactions)
        .await
        .unwrap();

    let mut forced = CsvSink::for_transactions(&config.output.transaction_csv_path);
    let summaries = crawl(&config, &[ReportKind::Transaction], true, &mut forced)
        .await
        .unwrap();

    assert_eq!(summaries[0].gate, Some(GateReason::Forced));
    assert_eq!(summaries[0].records_emitted, 3);
}

#[tokio::test]
async fn test_retry_converges_on_transient_failure() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    mount_account_page(&mock_server, "2", account_page(3, "Holder A", None)).await;

    // First response for page 3 lacks the page-count control
    Mock::given(method("GET"))
        .and(path("/oha.do"))
        .and(query_param("resultList.currentPageNumber", "3"))
        .respond_with(html("<html><body>maintenance</body></html>".to_string()))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_account_page(
        &mock_server,
        "3",
        account_page(3, "Holder B", Some("/singleAccount.do?accountID=2")),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/singleAccount.do"))
        .respond_with(html(detail_page("2021", "A")))
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::from_config(&config).unwrap();
    let mut accounts = CsvSink::for_accounts(&config.output.account_csv_path);
    let summary = coordinator.crawl_accounts(&mut accounts).await.unwrap();

    assert_eq!(summary.retries, 1);
    assert_eq!(summary.pages_abandoned, 0);
    assert_eq!(summary.pages_completed, 2);
    assert_eq!(summary.records_emitted, 1);
}

#[tokio::test]
async fn test_planning_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    mount_account_page(
        &mock_server,
        "2",
        "<html><body>Service unavailable</body></html>".to_string(),
    )
    .await;

    let mut accounts = CsvSink::for_accounts(&config.output.account_csv_path);
    let err = crawl(&config, &[ReportKind::Account], false, &mut accounts)
        .await
        .unwrap_err();

    assert!(matches!(err, EtsError::Planning { .. }));
    assert!(!std::path::Path::new(&config.output.account_csv_path).exists());
}

#[tokio::test]
async fn test_records_mirrored_into_sqlite() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    mount_transactions(&mock_server, "2024-05-31 09:00:00", 1).await;

    let storage = SqliteStorage::new(&dir.path().join("registry.db")).unwrap();
    let mut database = SqliteSink::new(storage, "hash");
    let mut transactions = CsvSink::for_transactions(&config.output.transaction_csv_path);

    let summaries = {
        let mut sink = MultiSink::new();
        sink.push(&mut transactions);
        sink.push(&mut database);
        crawl(&config, &[ReportKind::Transaction], false, &mut sink)
            .await
            .unwrap()
    };
    database.close_run(&summaries[0]).unwrap();

    assert_eq!(transactions.rows_written(), 3);

    let storage = database.storage();
    assert_eq!(storage.count_records(ReportKind::Transaction).unwrap(), 3);
    let run = storage
        .get_latest_run(ReportKind::Transaction)
        .unwrap()
        .unwrap();
    assert_eq!(run.records_emitted, 3);
}
