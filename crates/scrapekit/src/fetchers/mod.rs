//! Fetch layers and site-specific shortcuts
//!
//! Two kinds of fetchers live here:
//! - [`PageSource`] implementations return raw HTML for any URL. The
//!   pipeline owns one per chain slot (baseline, bypass, render) and
//!   decides when each runs.
//! - [`SiteFetcher`] implementations handle specific URL patterns through a
//!   site's content API. The [`SiteRegistry`] consults them before the
//!   generic chain.

mod baseline;
#[cfg(feature = "bypass")]
mod bypass;
mod help_center;
#[cfg(feature = "render")]
mod render;

pub use baseline::BaselineFetcher;
#[cfg(feature = "bypass")]
pub use bypass::BypassFetcher;
pub use help_center::HelpCenterFetcher;
#[cfg(feature = "render")]
pub use render::RenderFetcher;

use crate::error::FetchError;
use crate::options::ScrapeOptions;
use async_trait::async_trait;
use url::Url;

/// A way of obtaining raw HTML for a URL
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Fetch the page and return its HTML
    ///
    /// Implementations return the body whenever one was received, whatever
    /// the HTTP status; errors are reserved for getting no page at all.
    async fn fetch_html(&self, url: &str, options: &ScrapeOptions) -> Result<String, FetchError>;
}

/// Article returned by a site content API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteArticle {
    /// Title as reported by the API
    pub title: String,
    /// Article body HTML
    pub body_html: String,
    /// Locale or language of the article
    pub language: Option<String>,
}

/// Trait for site-specific content fetchers
///
/// Implement this trait to add a shortcut for a site whose markup is hard
/// to extract but which exposes a machine-readable content API.
#[async_trait]
pub trait SiteFetcher: Send + Sync {
    /// Unique identifier for this fetcher (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Returns true if this fetcher can handle the given URL
    fn matches(&self, url: &Url) -> bool;

    /// Fetch the article through the site API
    ///
    /// Called only if `matches()` returned true.
    async fn fetch(&self, url: &Url, options: &ScrapeOptions) -> Result<SiteArticle, FetchError>;
}

/// Registry of site fetchers consulted before the generic chain
///
/// Fetchers are tried in registration order; the first one that matches
/// and returns an article wins. Failures are logged and skipped.
pub struct SiteRegistry {
    fetchers: Vec<Box<dyn SiteFetcher>>,
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            fetchers: Vec::new(),
        }
    }

    /// Create a registry with the built-in site fetchers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HelpCenterFetcher::new()));
        registry
    }

    /// Register a fetcher
    pub fn register(&mut self, fetcher: Box<dyn SiteFetcher>) {
        self.fetchers.push(fetcher);
    }

    /// Names of registered fetchers, in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }

    /// Try every matching fetcher, returning the first article obtained
    pub async fn fetch(&self, url: &Url, options: &ScrapeOptions) -> Option<SiteArticle> {
        for fetcher in &self.fetchers {
            if !fetcher.matches(url) {
                continue;
            }

            tracing::debug!(fetcher = fetcher.name(), url = %url, "Using site fetcher");
            match fetcher.fetch(url, options).await {
                Ok(article) => return Some(article),
                Err(e) => {
                    tracing::debug!(fetcher = fetcher.name(), error = %e, "Site fetcher failed, falling through");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        pattern: &'static str,
        result: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl SiteFetcher for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn matches(&self, url: &Url) -> bool {
            url.path().starts_with(self.pattern)
        }

        async fn fetch(&self, _url: &Url, _options: &ScrapeOptions) -> Result<SiteArticle, FetchError> {
            match self.result {
                Ok(title) => Ok(SiteArticle {
                    title: title.to_string(),
                    ..Default::default()
                }),
                Err(msg) => Err(FetchError::SiteApiError(msg.to_string())),
            }
        }
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = SiteRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["help_center"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = SiteRegistry::new();
        assert!(registry.fetchers.is_empty());
    }

    #[tokio::test]
    async fn test_first_successful_match_wins() {
        let mut registry = SiteRegistry::new();
        registry.register(Box::new(Fixed {
            pattern: "/a",
            result: Err("down"),
        }));
        registry.register(Box::new(Fixed {
            pattern: "/other",
            result: Ok("unused"),
        }));
        registry.register(Box::new(Fixed {
            pattern: "/a",
            result: Ok("second"),
        }));

        let url = Url::parse("https://example.com/a/1").unwrap();
        let article = registry.fetch(&url, &ScrapeOptions::default()).await.unwrap();
        assert_eq!(article.title, "second");
    }

    #[tokio::test]
    async fn test_no_match_returns_none() {
        let registry = SiteRegistry::with_defaults();
        let url = Url::parse("https://example.com/blog/post").unwrap();
        assert!(registry.fetch(&url, &ScrapeOptions::default()).await.is_none());
    }
}
