//! HTML document queries
//!
//! Thin layer over `scraper` used by the planner and the extractors:
//! - attribute and element lookup by CSS selector
//! - table row enumeration that ignores rows of nested tables
//! - positional cell access (`nth element child`, 1-based like `nth-child`)
//! - link resolution against the page URL
//!
//! Every lookup answers with `Option` or an empty value; an unparsable
//! selector behaves like a selector that matches nothing.

use crate::extract::normalize_text;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A parsed HTML page
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses an HTML page
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// Returns the first element matching the selector
    pub fn first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(css).ok()?;
        self.html.select(&selector).next()
    }

    /// Returns every element matching the selector, in document order
    pub fn select_all(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Returns an attribute of the first element matching the selector
    ///
    /// # Example
    ///
    /// ```
    /// use ets_registry::crawler::Document;
    ///
    /// let doc = Document::parse(r#"<input name="resultList.lastPageNumber" value="12">"#);
    /// let value = doc.attr("input[name='resultList.lastPageNumber']", "value");
    /// assert_eq!(value.as_deref(), Some("12"));
    /// ```
    pub fn attr(&self, css: &str, attr: &str) -> Option<String> {
        self.first(css)
            .and_then(|element| element.value().attr(attr))
            .map(str::to_string)
    }

    /// Returns the data rows of the table matching the selector, without header rows
    pub fn table_rows(&self, css: &str, header_rows: usize) -> Vec<ElementRef<'_>> {
        self.first(css)
            .map(|table| table_rows(table).into_iter().skip(header_rows).collect())
            .unwrap_or_default()
    }

    /// Returns the rows of the table matching the selector, header rows included
    pub fn all_table_rows(&self, css: &str) -> Vec<ElementRef<'_>> {
        self.first(css).map(table_rows).unwrap_or_default()
    }
}

/// Rows that belong to `table` itself
///
/// Walks direct `tr` children and the `tr` children of `thead`, `tbody` and
/// `tfoot`, so rows of tables nested inside cells are never returned.
pub fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();

    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }

    rows
}

/// The `column`-th element child of a row (1-based, like `nth-child`)
pub fn cell(row: ElementRef<'_>, column: usize) -> Option<ElementRef<'_>> {
    if column == 0 {
        return None;
    }
    row.children().filter_map(ElementRef::wrap).nth(column - 1)
}

/// Normalised text of the first `span` inside a cell, or an empty string
pub fn cell_text(row: ElementRef<'_>, column: usize) -> String {
    let Some(cell) = cell(row, column) else {
        return String::new();
    };
    let Ok(span) = Selector::parse("span") else {
        return String::new();
    };

    cell.select(&span)
        .next()
        .map(|span| normalize_text(&span.text().collect::<String>()))
        .unwrap_or_default()
}

/// `href` of the first anchor matching `inner_css` inside a cell
pub fn cell_link(row: ElementRef<'_>, column: usize, inner_css: &str) -> Option<String> {
    let cell = cell(row, column)?;
    let selector = Selector::parse(inner_css).ok()?;

    cell.select(&selector)
        .find_map(|anchor| anchor.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None for empty hrefs, fragment-only links, `javascript:` and
/// `mailto:` links, and anything that does not resolve to HTTP or HTTPS.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}
