//! ScrapeKit - adaptive web page fetching and article extraction
//!
//! This crate turns a URL into a readable article: title, cleaned body
//! HTML, word count, source domain and the method that produced it.
//!
//! ## Fetch chain
//!
//! Each request walks an escalating chain and stops at the first layer
//! whose output is good enough:
//!
//! 1. Site shortcuts from the [`SiteRegistry`] (built-in:
//!    [`HelpCenterFetcher`])
//! 2. [`BaselineFetcher`] - plain GET with browser-like headers
//! 3. `BypassFetcher` - cookie-persisting client with a browser header
//!    profile (feature `bypass`)
//! 4. `RenderFetcher` - headless Chromium (feature `render`, with
//!    anti-detection patches under `stealth`)
//!
//! Thin content (fewer than 50 words) and bot-challenge pages escalate.
//! Results are cached per normalized URL for five minutes.
//!
//! ```no_run
//! use scrapekit::{FetchRequest, Tool};
//!
//! # async fn run() -> Result<(), scrapekit::ScrapeError> {
//! let tool = Tool::default();
//! let article = tool.execute(FetchRequest::new("https://example.com/post")).await?;
//! println!("{} ({} words via {})", article.title, article.word_count, article.scrape_method);
//! # Ok(())
//! # }
//! ```

mod cache;
mod capabilities;
mod classify;
mod error;
mod extract;
pub mod fetchers;
mod normalize;
mod options;
mod pipeline;
mod report;
mod tool;
mod types;

pub use cache::{ResultCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use capabilities::Capabilities;
pub use classify::{
    count_words, is_bot_challenge, is_thin, reading_time_minutes, THIN_CONTENT_THRESHOLD,
    WORDS_PER_MINUTE,
};
pub use error::{FetchError, ScrapeError};
pub use extract::{extract, Extracted};
pub use fetchers::{BaselineFetcher, HelpCenterFetcher, PageSource, SiteArticle, SiteFetcher, SiteRegistry};
pub use normalize::{extract_domain, normalize};
pub use options::ScrapeOptions;
pub use pipeline::Pipeline;
pub use report::{hint, ErrorCategory, FailureResponse};
pub use tool::{Tool, ToolBuilder};
pub use types::{FetchRequest, FetchResult, ScrapeMethod};

/// Default User-Agent string (desktop Chrome)
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Tool description for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Fetches a web page and extracts its readable article content.

- Escalates from plain HTTP to a challenge-bypass client and a headless browser
- Strips navigation, sidebars and scripts; returns paragraphs as HTML
- Reports title, word count, source domain and the method used
- Failures come with a category and an actionable hint"#;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# ScrapeKit Tool

Fetches a web page and extracts its readable article content.

## Capabilities
- Plain HTTP fetch with browser-like headers
- Challenge-bypass client with cookies and a full browser header profile
- Headless Chromium rendering for JavaScript-heavy pages
- Help-center article API shortcut
- Reader-mode URL unwrapping (about:reader?url=...)
- Five-minute result cache

## Input Parameters
- `url` (required): The URL to fetch (must be http:// or https://)

## Output Fields
- `title`: Page title
- `content_html`: Cleaned article body as `<p>` elements
- `word_count`: Words in `content_html`
- `source_domain`: Host without a leading `www.`
- `scrape_method`: "site_api", "baseline", "bypass" or "render"
- `language`: Declared document language, if any

## Failure Fields
- `error`: Categorized message with the underlying cause
- `error_code`: "blocked", "timeout", "bot_challenge" or "fetch_failed"
- `hint`: Which backend to enable next
- `capabilities`: Backends available when the failure happened

## Examples

### Fetch an article
```json
{"url": "https://example.com/blog/post"}
```

### Unwrap a reader-mode URL
```json
{"url": "about:reader?url=https%3A%2F%2Fexample.com%2Fpost"}
```

## Error Handling
- Empty or non-http(s) URLs return an error
- Pages with little text are returned best-effort when no better layer succeeds
- An error is returned only when no layer could retrieve the page
"#;
