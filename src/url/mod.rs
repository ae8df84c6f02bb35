//! Registry URL handling
//!
//! The registry paginates its reports through a single query parameter,
//! `resultList.currentPageNumber`. This module rewrites that parameter on a
//! template URL and validates configured entry points.

use crate::{EtsError, Result};
use url::Url;

/// Query parameter carrying the site's own page number
pub const PAGE_PARAM: &str = "resultList.currentPageNumber";

/// Parses a configured registry URL, accepting only HTTP and HTTPS
///
/// # Examples
///
/// ```
/// use ets_registry::url::parse_registry_url;
///
/// assert!(parse_registry_url("https://ec.europa.eu/clima/ets/oha.do").is_ok());
/// assert!(parse_registry_url("ftp://ec.europa.eu/").is_err());
/// ```
pub fn parse_registry_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(EtsError::Planning {
            url: raw.to_string(),
            message: format!("unsupported scheme {}", other),
        }),
    }
}

/// Returns `template` with its site page number set to `page`
///
/// Every other query pair keeps its position and value. When the template
/// has no page parameter, it is appended.
///
/// # Examples
///
/// ```
/// use ets_registry::url::{page_number, with_page_number};
/// use url::Url;
///
/// let template = Url::parse("https://example.org/oha.do?form=oha&resultList.currentPageNumber=3").unwrap();
/// let page = with_page_number(&template, 7);
/// assert_eq!(page_number(&page), Some(7));
/// assert!(page.as_str().starts_with("https://example.org/oha.do?form=oha&"));
/// ```
pub fn with_page_number(template: &Url, page: u32) -> Url {
    let pairs: Vec<(String, String)> = template.query_pairs().into_owned().collect();
    let page = page.to_string();
    let mut url = template.clone();

    {
        let mut query = url.query_pairs_mut();
        query.clear();

        let mut replaced = false;
        for (key, value) in &pairs {
            if key == PAGE_PARAM {
                if !replaced {
                    query.append_pair(key, &page);
                    replaced = true;
                }
            } else {
                query.append_pair(key, value);
            }
        }

        if !replaced {
            query.append_pair(PAGE_PARAM, &page);
        }
    }

    url
}

/// Site page number carried by a URL, if any
pub fn page_number(url: &Url) -> Option<u32> {
    url.query_pairs()
        .find(|(key, _)| key == PAGE_PARAM)
        .and_then(|(_, value)| value.parse().ok())
}
