//! Challenge-bypass fetcher
//!
//! Many bot-protection front ends only challenge clients that look
//! scripted: no cookies, a bare header set, a cold first request straight
//! to a deep link. This fetcher presents a full desktop-Chrome header
//! profile, keeps a cookie jar for the request, and warms the session on
//! the site origin before asking for the article with the origin as
//! referer.

use crate::error::FetchError;
use crate::fetchers::baseline::{read_html, user_agent_header, BROWSER_ACCEPT, BROWSER_ACCEPT_LANGUAGE};
use crate::fetchers::PageSource;
use crate::options::ScrapeOptions;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tracing::debug;
use url::Url;

/// Client hints and fetch metadata sent by desktop Chrome on navigation
const BROWSER_PROFILE: &[(&str, &str)] = &[
    ("sec-ch-ua", "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\""),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    ("cache-control", "max-age=0"),
];

/// Cookie-persisting fetcher with a browser header profile
pub struct BypassFetcher;

impl BypassFetcher {
    /// Create a new bypass fetcher
    pub fn new() -> Self {
        Self
    }

    fn profile_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent_header(user_agent));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
        for (name, value) in BROWSER_PROFILE {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        headers
    }
}

impl Default for BypassFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for BypassFetcher {
    fn name(&self) -> &'static str {
        "bypass"
    }

    async fn fetch_html(&self, url: &str, options: &ScrapeOptions) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::RequestError(e.to_string()))?;
        let origin = format!("{}/", parsed.origin().ascii_serialization());

        let client = reqwest::Client::builder()
            .default_headers(Self::profile_headers(&options.user_agent))
            .cookie_store(true)
            .connect_timeout(options.bypass_timeout)
            .timeout(options.bypass_timeout)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        if origin != url {
            // Only the cookies matter; the origin page itself is discarded
            match client.get(&origin).send().await {
                Ok(resp) => {
                    debug!(status = resp.status().as_u16(), origin = %origin, "Warmed session");
                    let _ = resp.bytes().await;
                }
                Err(e) => debug!(error = %e, origin = %origin, "Session warm-up failed"),
            }
        }

        let response = client
            .get(url)
            .header(REFERER, origin.as_str())
            .header("sec-fetch-site", "same-origin")
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, options.bypass_timeout))?;

        read_html(response, options.bypass_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_headers() {
        let headers = BypassFetcher::profile_headers("Agent/1.0");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "Agent/1.0");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(headers.get("upgrade-insecure-requests").unwrap(), "1");
        assert!(headers.get(ACCEPT).is_some());
    }

    #[test]
    fn test_bypass_name() {
        assert_eq!(BypassFetcher::new().name(), "bypass");
    }
}
