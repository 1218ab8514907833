//! Tool builder and contract for ScrapeKit

use crate::cache::ResultCache;
use crate::capabilities::Capabilities;
use crate::error::ScrapeError;
use crate::fetchers::{BaselineFetcher, PageSource, SiteRegistry};
use crate::options::ScrapeOptions;
use crate::pipeline::Pipeline;
use crate::report::FailureResponse;
use crate::types::{FetchRequest, FetchResult};
use crate::{TOOL_DESCRIPTION, TOOL_LLMTXT};
use schemars::schema_for;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring the ScrapeKit tool
#[derive(Default)]
pub struct ToolBuilder {
    options: ScrapeOptions,
    capabilities: Option<Capabilities>,
    sites: Option<SiteRegistry>,
    cache: Option<Arc<ResultCache>>,
    baseline: Option<Box<dyn PageSource>>,
    bypass: Option<Box<dyn PageSource>>,
    render: Option<Box<dyn PageSource>>,
}

impl ToolBuilder {
    /// Create a new tool builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.options.user_agent = ua.into();
        self
    }

    /// Word count below which a page is treated as thin
    pub fn min_words(mut self, min_words: usize) -> Self {
        self.options.min_words = min_words;
        self
    }

    /// Timeout for the baseline HTTP fetch
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.options.http_timeout = timeout;
        self
    }

    /// Timeout for the challenge-bypass fetch
    pub fn bypass_timeout(mut self, timeout: Duration) -> Self {
        self.options.bypass_timeout = timeout;
        self
    }

    /// Hard timeout for a headless render
    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.options.render_timeout = timeout;
        self
    }

    /// Cache time-to-live and size bound
    pub fn cache_limits(mut self, ttl: Duration, capacity: usize) -> Self {
        self.options.cache_ttl = ttl;
        self.options.cache_capacity = capacity;
        self
    }

    /// Use a specific Chrome/Chromium binary
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.chrome_executable = Some(path.into());
        self
    }

    /// Replace all options at once
    pub fn options(mut self, options: ScrapeOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a fixed capability snapshot instead of probing at build time
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Replace the site shortcut registry
    pub fn site_registry(mut self, sites: SiteRegistry) -> Self {
        self.sites = Some(sites);
        self
    }

    /// Share a cache between tools
    pub fn cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the baseline layer
    pub fn baseline(mut self, source: Box<dyn PageSource>) -> Self {
        self.baseline = Some(source);
        self
    }

    /// Replace the challenge-bypass layer
    pub fn bypass(mut self, source: Box<dyn PageSource>) -> Self {
        self.bypass = Some(source);
        self
    }

    /// Replace the headless-render layer
    pub fn render(mut self, source: Box<dyn PageSource>) -> Self {
        self.render = Some(source);
        self
    }

    /// Build the tool
    pub fn build(self) -> Tool {
        let capabilities = self
            .capabilities
            .unwrap_or_else(|| Capabilities::detect_with(self.options.chrome_executable.as_deref()));

        let baseline = self
            .baseline
            .unwrap_or_else(|| Box::new(BaselineFetcher::new()));
        let mut pipeline = Pipeline::new(self.options, capabilities, baseline)
            .with_sites(self.sites.unwrap_or_else(SiteRegistry::with_defaults));

        if let Some(cache) = self.cache {
            pipeline = pipeline.with_cache(cache);
        }
        if let Some(bypass) = self.bypass.or_else(default_bypass) {
            pipeline = pipeline.with_bypass(bypass);
        }
        if let Some(render) = self.render.or_else(|| default_render(capabilities)) {
            pipeline = pipeline.with_render(render);
        }

        Tool {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[cfg(feature = "bypass")]
fn default_bypass() -> Option<Box<dyn PageSource>> {
    Some(Box::new(crate::fetchers::BypassFetcher::new()))
}

#[cfg(not(feature = "bypass"))]
fn default_bypass() -> Option<Box<dyn PageSource>> {
    None
}

#[cfg(feature = "render")]
fn default_render(capabilities: Capabilities) -> Option<Box<dyn PageSource>> {
    Some(Box::new(crate::fetchers::RenderFetcher::new(capabilities.stealth)))
}

#[cfg(not(feature = "render"))]
fn default_render(_capabilities: Capabilities) -> Option<Box<dyn PageSource>> {
    None
}

/// Configured ScrapeKit tool
///
/// Cheap to clone; clones share the pipeline and its cache.
#[derive(Clone)]
pub struct Tool {
    pipeline: Arc<Pipeline>,
}

impl Default for Tool {
    fn default() -> Self {
        ToolBuilder::new().build()
    }
}

impl Tool {
    /// Create a new tool builder
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    /// Get tool description
    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Get input schema as JSON
    pub fn input_schema(&self) -> serde_json::Value {
        let schema = schema_for!(FetchRequest);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Get output schema as JSON
    pub fn output_schema(&self) -> serde_json::Value {
        let schema = schema_for!(FetchResult);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Get failure payload schema as JSON
    pub fn failure_schema(&self) -> serde_json::Value {
        let schema = schema_for!(FailureResponse);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Backends available to this tool, without fetching anything
    pub fn capabilities(&self) -> Capabilities {
        self.pipeline.capabilities()
    }

    /// Options in effect
    pub fn options(&self) -> &ScrapeOptions {
        self.pipeline.options()
    }

    /// Result cache shared by clones of this tool
    pub fn cache(&self) -> &Arc<ResultCache> {
        self.pipeline.cache()
    }

    /// Execute the tool with the given request
    pub async fn execute(&self, req: FetchRequest) -> Result<FetchResult, ScrapeError> {
        self.pipeline.run(&req.url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_builder() {
        let tool = Tool::builder()
            .user_agent("TestAgent/1.0")
            .min_words(10)
            .http_timeout(Duration::from_secs(5))
            .render_timeout(Duration::from_secs(12))
            .cache_limits(Duration::from_secs(60), 5)
            .capabilities(Capabilities::none())
            .build();

        let options = tool.options();
        assert_eq!(options.user_agent, "TestAgent/1.0");
        assert_eq!(options.min_words, 10);
        assert_eq!(options.http_timeout, Duration::from_secs(5));
        assert_eq!(options.render_timeout, Duration::from_secs(12));
        assert_eq!(tool.cache().ttl(), Duration::from_secs(60));
        assert_eq!(tool.capabilities(), Capabilities::none());
    }

    #[test]
    fn test_tool_description() {
        let tool = Tool::builder().capabilities(Capabilities::none()).build();
        assert!(!tool.description().is_empty());
        assert!(!tool.llmtxt().is_empty());
    }

    #[test]
    fn test_tool_schemas() {
        let tool = Tool::builder().capabilities(Capabilities::none()).build();
        let input_schema = tool.input_schema();
        let output_schema = tool.output_schema();
        let failure_schema = tool.failure_schema();

        assert!(input_schema["properties"]["url"].is_object());
        assert!(output_schema["properties"]["content_html"].is_object());
        assert!(output_schema["properties"]["scrape_method"].is_object());
        assert!(failure_schema["properties"]["error_code"].is_object());
        assert!(failure_schema["properties"]["hint"].is_object());
    }

    #[test]
    fn test_clones_share_cache() {
        let tool = Tool::builder().capabilities(Capabilities::none()).build();
        let clone = tool.clone();
        assert!(Arc::ptr_eq(tool.cache(), clone.cache()));
    }

    #[test]
    fn test_explicit_shared_cache() {
        let cache = Arc::new(ResultCache::default());
        let a = Tool::builder()
            .capabilities(Capabilities::none())
            .cache(cache.clone())
            .build();
        let b = Tool::builder()
            .capabilities(Capabilities::none())
            .cache(cache.clone())
            .build();
        assert!(Arc::ptr_eq(a.cache(), &cache));
        assert!(Arc::ptr_eq(b.cache(), &cache));
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_scheme() {
        let tool = Tool::builder().capabilities(Capabilities::none()).build();
        let err = tool.execute(FetchRequest::new("ftp://example.com")).await.unwrap_err();
        assert_eq!(err.detail, "Invalid URL: must start with http:// or https://");
    }
}
