//! Adaptive fetch pipeline
//!
//! Each request walks a fixed chain: site shortcut, baseline HTTP,
//! challenge bypass, headless render. Every layer runs at most once and the
//! pipeline alone decides whether to accept its output or escalate. When no
//! layer is accepted, the extraction of the most recently obtained HTML is
//! returned as a best-effort result, tagged with the layer that fetched it.

use crate::cache::ResultCache;
use crate::capabilities::Capabilities;
use crate::classify::{is_bot_challenge, is_thin};
use crate::error::ScrapeError;
use crate::extract::extract;
use crate::fetchers::{PageSource, SiteRegistry};
use crate::normalize::normalize;
use crate::options::ScrapeOptions;
use crate::types::{FetchResult, ScrapeMethod};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Outcome of evaluating one layer of the chain
#[derive(Debug)]
enum LayerOutcome {
    /// Good enough to return
    Accepted(FetchResult),
    /// Move on to the next layer
    Escalate {
        /// Extraction of the HTML this layer obtained, if any
        candidate: Option<FetchResult>,
        /// Error that prevented the layer from obtaining HTML
        detail: Option<String>,
    },
    /// Backend missing or disabled
    Unavailable,
}

/// One slot of the generic chain
struct Stage<'a> {
    method: ScrapeMethod,
    source: Option<&'a dyn PageSource>,
    available: bool,
    accept_thin: bool,
}

/// Fetch-and-extract pipeline shared by all requests of a tool
pub struct Pipeline {
    options: ScrapeOptions,
    capabilities: Capabilities,
    cache: Arc<ResultCache>,
    sites: SiteRegistry,
    baseline: Box<dyn PageSource>,
    bypass: Option<Box<dyn PageSource>>,
    render: Option<Box<dyn PageSource>>,
}

impl Pipeline {
    /// Create a pipeline with only the baseline layer and no site shortcuts
    pub fn new(options: ScrapeOptions, capabilities: Capabilities, baseline: Box<dyn PageSource>) -> Self {
        let cache = Arc::new(ResultCache::new(options.cache_ttl, options.cache_capacity));
        Self {
            options,
            capabilities,
            cache,
            sites: SiteRegistry::new(),
            baseline,
            bypass: None,
            render: None,
        }
    }

    /// Use a shared cache instead of a private one
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Set the site shortcut registry
    pub fn with_sites(mut self, sites: SiteRegistry) -> Self {
        self.sites = sites;
        self
    }

    /// Set the challenge-bypass layer
    pub fn with_bypass(mut self, source: Box<dyn PageSource>) -> Self {
        self.bypass = Some(source);
        self
    }

    /// Set the headless-render layer
    pub fn with_render(mut self, source: Box<dyn PageSource>) -> Self {
        self.render = Some(source);
        self
    }

    /// Capability snapshot this pipeline was built with
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Result cache
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Options shared by every layer
    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    /// Fetch and extract the article at `raw_url`.
    ///
    /// Fails only when the URL is unusable or no layer obtained any HTML.
    pub async fn run(&self, raw_url: &str) -> Result<FetchResult, ScrapeError> {
        let url = normalize(raw_url);

        if url.is_empty() {
            return Err(self.failure(url, "Missing required parameter: url"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(self.failure(url, "Invalid URL: must start with http:// or https://"));
        }

        if let Some(hit) = self.cache.get(&url) {
            debug!(url = %url, "Cache hit");
            return Ok(hit);
        }

        let result = self.scrape(&url).await?;
        self.cache.put(url, result.clone());
        Ok(result)
    }

    async fn scrape(&self, url: &str) -> Result<FetchResult, ScrapeError> {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(result) = self.try_site_api(&parsed, url).await {
                return Ok(result);
            }
        }

        let mut best_effort = None;
        let mut detail = None;

        for stage in self.stages() {
            match self.attempt(&stage, url).await {
                LayerOutcome::Accepted(result) => {
                    debug!(url = %url, method = %result.scrape_method, words = result.word_count, "Accepted");
                    return Ok(result);
                }
                LayerOutcome::Escalate {
                    candidate,
                    detail: error,
                } => {
                    if candidate.is_some() {
                        best_effort = candidate;
                    }
                    if error.is_some() {
                        detail = error;
                    }
                }
                LayerOutcome::Unavailable => {
                    debug!(layer = %stage.method, "Layer unavailable, skipping");
                }
            }
        }

        match best_effort {
            Some(result) => {
                info!(
                    url = %url,
                    method = %result.scrape_method,
                    words = result.word_count,
                    "Returning best-effort result"
                );
                Ok(result)
            }
            None => {
                let detail = detail.unwrap_or_else(|| "All scraping methods failed".to_string());
                info!(url = %url, detail = %detail, "All layers failed");
                Err(self.failure(url, detail))
            }
        }
    }

    async fn try_site_api(&self, parsed: &Url, url: &str) -> Option<FetchResult> {
        let article = self.sites.fetch(parsed, &self.options).await?;
        let extracted = extract(&article.body_html);

        let title = if article.title.is_empty() {
            extracted.title
        } else {
            article.title
        };
        let language = article.language.or(extracted.language);
        let result = FetchResult::new(title, extracted.content_html, url, ScrapeMethod::SiteApi, language);

        if is_thin(&result.content_html, self.options.min_words) {
            debug!(url = %url, words = result.word_count, "Site API content thin, falling through");
            return None;
        }
        Some(result)
    }

    fn stages(&self) -> [Stage<'_>; 3] {
        [
            Stage {
                method: ScrapeMethod::Baseline,
                source: Some(self.baseline.as_ref()),
                available: true,
                accept_thin: false,
            },
            Stage {
                method: ScrapeMethod::Bypass,
                source: self.bypass.as_deref(),
                available: self.capabilities.challenge_bypass,
                accept_thin: false,
            },
            Stage {
                method: ScrapeMethod::Render,
                source: self.render.as_deref(),
                available: self.capabilities.headless_browser,
                accept_thin: true,
            },
        ]
    }

    async fn attempt(&self, stage: &Stage<'_>, url: &str) -> LayerOutcome {
        let Some(source) = stage.source.filter(|_| stage.available) else {
            return LayerOutcome::Unavailable;
        };

        debug!(layer = %stage.method, source = source.name(), url = %url, "Fetching");
        let html = match source.fetch_html(url, &self.options).await {
            Ok(html) => html,
            Err(e) => {
                info!(layer = %stage.method, error = %e, "Layer failed, escalating");
                return LayerOutcome::Escalate {
                    candidate: None,
                    detail: Some(e.detail()),
                };
            }
        };

        let extracted = extract(&html);
        let result = FetchResult::new(
            extracted.title,
            extracted.content_html,
            url,
            stage.method,
            extracted.language,
        );

        if stage.accept_thin {
            return LayerOutcome::Accepted(result);
        }

        if is_bot_challenge(&html) {
            info!(layer = %stage.method, url = %url, "Bot challenge detected, escalating");
            return LayerOutcome::Escalate {
                candidate: Some(result),
                detail: None,
            };
        }

        if is_thin(&result.content_html, self.options.min_words) {
            info!(layer = %stage.method, words = result.word_count, "Thin content, escalating");
            return LayerOutcome::Escalate {
                candidate: Some(result),
                detail: None,
            };
        }

        LayerOutcome::Accepted(result)
    }

    fn failure(&self, url: impl Into<String>, detail: impl Into<String>) -> ScrapeError {
        ScrapeError::new(url, detail, self.capabilities)
    }
}
