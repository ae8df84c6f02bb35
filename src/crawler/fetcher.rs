//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a descriptive user agent string
//! - Following redirects and keeping the registry's session cookies
//! - Capping the number of requests in flight across the whole run
//! - Surfacing transport failures and non-success statuses as errors

use crate::config::{Config, UserAgentConfig};
use crate::{EtsError, Result};
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Page body content
    pub body: String,
}

/// Resolves a URL to a page body
///
/// The crawler is generic over this trait so extraction can run against
/// canned pages in tests.
pub trait PageFetcher {
    /// Fetches one URL, following redirects
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage>>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use ets_registry::config::UserAgentConfig;
/// use ets_registry::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "EtsRegistry".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Formats the user agent as `Name/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// `PageFetcher` over a shared `reqwest` client
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    permits: Arc<Semaphore>,
}

impl HttpFetcher {
    /// Creates a fetcher from the crawler and user agent settings
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;

        Ok(Self::with_client(
            client,
            config.crawler.max_concurrent_requests as usize,
        ))
    }

    /// Wraps an existing client, allowing `max_in_flight` concurrent requests
    pub fn with_client(client: Client, max_in_flight: usize) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    async fn send(&self, url: &Url) -> std::result::Result<FetchedPage, reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await?;

        Ok(FetchedPage {
            final_url,
            status_code,
            body,
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let _permit = self.permits.acquire().await.map_err(|_| {
            EtsError::Io(std::io::Error::other("request limiter closed"))
        })?;

        tracing::debug!("GET {}", url);

        let page = self.send(url).await.map_err(|source| EtsError::Http {
            url: url.to_string(),
            source,
        })?;

        if page.final_url != *url {
            tracing::trace!("{} redirected to {}", url, page.final_url);
        }

        Ok(page)
    }
}
