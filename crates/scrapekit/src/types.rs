//! Core types for ScrapeKit

use crate::classify::count_words;
use crate::normalize::extract_domain;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which layer of the fetch chain produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeMethod {
    /// Site-specific content API shortcut
    SiteApi,
    /// Plain HTTP GET with browser-like headers
    Baseline,
    /// Cookie-persisting challenge-bypass client
    Bypass,
    /// Headless browser rendering
    Render,
}

impl ScrapeMethod {
    /// Wire tag for this method
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeMethod::SiteApi => "site_api",
            ScrapeMethod::Baseline => "baseline",
            ScrapeMethod::Bypass => "bypass",
            ScrapeMethod::Render => "render",
        }
    }
}

impl fmt::Display for ScrapeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to fetch and extract a page
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FetchRequest {
    /// The URL to fetch (http:// or https://, or a reader-mode wrapped URL)
    pub url: String,
}

impl FetchRequest {
    /// Create a new request with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Readable article extracted from a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FetchResult {
    /// Page title
    pub title: String,

    /// Cleaned article body as a sequence of `<p>` elements
    pub content_html: String,

    /// Number of words in `content_html`
    pub word_count: usize,

    /// Host of the source page without a leading `www.`
    pub source_domain: String,

    /// Layer that produced this result
    pub scrape_method: ScrapeMethod,

    /// Declared document language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl FetchResult {
    /// Build a result, deriving `word_count` and `source_domain`.
    ///
    /// The word count is always computed here from `content_html`; there is
    /// no way to construct a result with a caller-supplied count.
    pub fn new(
        title: impl Into<String>,
        content_html: impl Into<String>,
        url: &str,
        scrape_method: ScrapeMethod,
        language: Option<String>,
    ) -> Self {
        let content_html = content_html.into();
        Self {
            title: title.into(),
            word_count: count_words(&content_html),
            content_html,
            source_domain: extract_domain(url),
            scrape_method,
            language,
        }
    }
}
