//! ETS Registry main entry point
//!
//! This is the command-line interface for the EU ETS registry crawler.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use ets_registry::config::{load_config_with_hash, Config};
use ets_registry::crawler::{crawl, RegistryEndpoints, ReportKind};
use ets_registry::output::{
    generate_markdown_summary, load_statistics, print_statistics, CrawlSummary, CsvSink,
    MultiSink, SqliteSink,
};
use ets_registry::storage::open_storage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// ETS Registry: paginated extractor for the EU ETS public registry
///
/// Crawls the account/compliance and transaction reports and writes them
/// as CSV, optionally mirrored into SQLite. The transaction crawl is skipped
/// when the registry has not changed since the last run.
#[derive(Parser, Debug)]
#[command(name = "ets-registry")]
#[command(version = "1.0.0")]
#[command(about = "Crawls the EU ETS public registry", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Reports to crawl
    #[arg(long, value_enum, default_value_t = ReportSelection::All)]
    report: ReportSelection,

    /// Crawl transactions even when the registry looks unchanged
    #[arg(long)]
    force: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the entry URLs without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportSelection {
    Accounts,
    Transactions,
    All,
}

impl ReportSelection {
    fn kinds(self) -> Vec<ReportKind> {
        match self {
            Self::Accounts => vec![ReportKind::Account],
            Self::Transactions => vec![ReportKind::Transaction],
            Self::All => vec![ReportKind::Account, ReportKind::Transaction],
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context(format!("invalid config {}", cli.config.display()));
        }
    };

    let reports = cli.report.kinds();

    if cli.dry_run {
        handle_dry_run(&config, &reports)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &config_hash, &reports, cli.force).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ets_registry=info,warn"),
            1 => EnvFilter::new("ets_registry=debug,info"),
            2 => EnvFilter::new("ets_registry=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the entry URLs
fn handle_dry_run(config: &Config, reports: &[ReportKind]) -> anyhow::Result<()> {
    let endpoints = RegistryEndpoints::from_config(&config.registry)?;

    println!("=== ETS Registry Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages
    );
    println!(
        "  Max concurrent details: {}",
        config.crawler.max_concurrent_details
    );
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    match config.crawler.max_page_retries {
        Some(limit) => println!("  Max page retries: {}", limit),
        None => println!("  Max page retries: unbounded"),
    }
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!(
        "  Forced refresh after: {} days",
        config.crawler.force_refresh_days
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Accounts CSV: {}", config.output.account_csv_path);
    println!("  Transactions CSV: {}", config.output.transaction_csv_path);
    println!("  Crawl state: {}", config.output.state_path);
    if let Some(path) = &config.output.database_path {
        println!("  Database: {}", path);
    }
    if let Some(path) = &config.output.summary_path {
        println!("  Summary: {}", path);
    }

    println!("\nEntry URLs:");
    for kind in reports {
        println!("  - {}: {}", kind, endpoints.planning_url(*kind));
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} report(s)", reports.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = config
        .output
        .database_path
        .as_deref()
        .context("--stats needs output.database-path in the config")?;

    println!("Database: {}\n", path);

    let storage = open_storage(Path::new(path))
        .with_context(|| format!("failed to open database {}", path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    reports: &[ReportKind],
    force: bool,
) -> anyhow::Result<()> {
    if force {
        tracing::info!("Update gate bypassed (--force)");
    }

    let mut accounts_csv = CsvSink::for_accounts(&config.output.account_csv_path);
    let mut transactions_csv = CsvSink::for_transactions(&config.output.transaction_csv_path);
    let mut database = match &config.output.database_path {
        Some(path) => {
            let storage = open_storage(Path::new(path))
                .with_context(|| format!("failed to open database {}", path))?;
            Some(SqliteSink::new(storage, config_hash))
        }
        None => None,
    };

    let result = {
        let mut sink = MultiSink::new();
        if reports.contains(&ReportKind::Account) {
            sink.push(&mut accounts_csv);
        }
        if reports.contains(&ReportKind::Transaction) {
            sink.push(&mut transactions_csv);
        }
        if let Some(database) = database.as_mut() {
            sink.push(database);
        }

        crawl(config, reports, force, &mut sink).await
    };

    let summaries = match result {
        Ok(summaries) => summaries,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            if let Some(database) = database.as_mut() {
                database.fail_open_runs()?;
            }
            return Err(e.into());
        }
    };

    if let Some(database) = database.as_mut() {
        for summary in &summaries {
            database.close_run(summary)?;
        }
    }

    if let Some(path) = &config.output.summary_path {
        write_summary(&summaries, config_hash, Path::new(path))?;
    }

    tracing::info!("Crawl completed successfully");
    Ok(())
}

fn write_summary(summaries: &[CrawlSummary], config_hash: &str, path: &Path) -> anyhow::Result<()> {
    generate_markdown_summary(summaries, config_hash, path)
        .with_context(|| format!("failed to write summary {}", path.display()))?;
    tracing::info!("Summary written to: {}", path.display());
    Ok(())
}
