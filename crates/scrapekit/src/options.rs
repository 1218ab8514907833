//! Pipeline configuration

use crate::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
use crate::classify::THIN_CONTENT_THRESHOLD;
use crate::DEFAULT_USER_AGENT;
use std::path::PathBuf;
use std::time::Duration;

/// Options shared by every layer of the fetch chain
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// User-Agent sent by the HTTP layers and the browser
    pub user_agent: String,
    /// Total timeout for the baseline GET
    pub http_timeout: Duration,
    /// Total timeout for the challenge-bypass client
    pub bypass_timeout: Duration,
    /// Hard timeout for a headless render, browser launch included
    pub render_timeout: Duration,
    /// Extra wait after the page goes quiet, for late-loading content
    pub settle_delay: Duration,
    /// Timeout for site content API calls
    pub site_api_timeout: Duration,
    /// Extracted content below this many words triggers escalation
    pub min_words: usize,
    /// Cache time-to-live
    pub cache_ttl: Duration,
    /// Cache size bound
    pub cache_capacity: usize,
    /// Browser binary to use instead of auto-detection
    pub chrome_executable: Option<PathBuf>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout: Duration::from_secs(15),
            bypass_timeout: Duration::from_secs(20),
            render_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            site_api_timeout: Duration::from_secs(10),
            min_words: THIN_CONTENT_THRESHOLD,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            chrome_executable: None,
        }
    }
}
