//! Help-center article fetcher
//!
//! Hosted help centers render articles inside heavy client-side shells,
//! but serve the same article as JSON at a predictable API path:
//! `/hc/{locale}/articles/{id}-{slug}` maps to
//! `/api/v2/help_center/{locale}/articles/{id}.json` on the same host.

use crate::error::FetchError;
use crate::fetchers::baseline::user_agent_header;
use crate::fetchers::{SiteArticle, SiteFetcher};
use crate::options::ScrapeOptions;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use url::Url;

/// Help-center article fetcher
pub struct HelpCenterFetcher;

impl HelpCenterFetcher {
    /// Create a new help-center fetcher
    pub fn new() -> Self {
        Self
    }

    /// Extract locale and article id from a help-center article URL
    fn parse_article_url(url: &Url) -> Option<(String, String)> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
        let [hc, locale, articles, slug, ..] = segments.as_slice() else {
            return None;
        };

        if *hc != "hc" || *articles != "articles" {
            return None;
        }

        let valid_locale = (2..=10).contains(&locale.len())
            && locale.chars().all(|c| c.is_ascii_alphabetic() || c == '-');
        if !valid_locale {
            return None;
        }

        let id: String = slug.chars().take_while(|c| c.is_ascii_digit()).collect();
        if id.is_empty() {
            return None;
        }

        Some((locale.to_string(), id))
    }

    fn api_url(url: &Url, locale: &str, id: &str) -> Url {
        let mut api = url.clone();
        api.set_path(&format!("/api/v2/help_center/{}/articles/{}.json", locale, id));
        api.set_query(None);
        api.set_fragment(None);
        api
    }
}

impl Default for HelpCenterFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// API envelope (partial)
#[derive(Debug, Deserialize)]
struct ArticleEnvelope {
    article: HelpCenterArticle,
}

#[derive(Debug, Deserialize)]
struct HelpCenterArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

#[async_trait]
impl SiteFetcher for HelpCenterFetcher {
    fn name(&self) -> &'static str {
        "help_center"
    }

    fn matches(&self, url: &Url) -> bool {
        Self::parse_article_url(url).is_some()
    }

    async fn fetch(&self, url: &Url, options: &ScrapeOptions) -> Result<SiteArticle, FetchError> {
        let (locale, id) = Self::parse_article_url(url).ok_or_else(|| {
            FetchError::SiteApiError("Not a help-center article URL".to_string())
        })?;
        let api_url = Self::api_url(url, &locale, &id);

        let client = reqwest::Client::builder()
            .connect_timeout(options.site_api_timeout)
            .timeout(options.site_api_timeout)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        let response = client
            .get(api_url)
            .header(USER_AGENT, user_agent_header(&options.user_agent))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, options.site_api_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::SiteApiError(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let envelope: ArticleEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::SiteApiError(format!("Failed to parse article: {}", e)))?;

        let article = envelope.article;
        let body_html = article.body.unwrap_or_default();
        if body_html.trim().is_empty() {
            return Err(FetchError::SiteApiError("Article body is empty".to_string()));
        }

        Ok(SiteArticle {
            title: article.title.trim().to_string(),
            body_html,
            language: article.locale.or(Some(locale)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(url: &str) -> Option<(String, String)> {
        HelpCenterFetcher::parse_article_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_parse_article_url_valid() {
        assert_eq!(
            parse("https://support.example.com/hc/en-us/articles/360001234567-Reset-your-password"),
            Some(("en-us".to_string(), "360001234567".to_string()))
        );
        assert_eq!(
            parse("https://help.example.org/hc/de/articles/42"),
            Some(("de".to_string(), "42".to_string()))
        );
    }

    #[test]
    fn test_parse_article_url_ignores_query() {
        assert_eq!(
            parse("https://support.example.com/hc/fr/articles/9-x?utm_source=feed#top"),
            Some(("fr".to_string(), "9".to_string()))
        );
    }

    #[test]
    fn test_parse_article_url_invalid() {
        assert_eq!(parse("https://support.example.com/hc/en-us/sections/123-faq"), None);
        assert_eq!(parse("https://support.example.com/hc/en-us/articles/reset"), None);
        assert_eq!(parse("https://support.example.com/hc/en-us"), None);
        assert_eq!(parse("https://support.example.com/docs/en-us/articles/1"), None);
        assert_eq!(parse("https://support.example.com/hc/en_us!/articles/1"), None);
        assert_eq!(parse("ftp://support.example.com/hc/en-us/articles/1"), None);
    }

    #[test]
    fn test_api_url() {
        let url = Url::parse("https://support.example.com:8443/hc/en-us/articles/77-title?x=1").unwrap();
        assert_eq!(
            HelpCenterFetcher::api_url(&url, "en-us", "77").as_str(),
            "https://support.example.com:8443/api/v2/help_center/en-us/articles/77.json"
        );
    }

    #[test]
    fn test_fetcher_matches() {
        let fetcher = HelpCenterFetcher::new();
        assert!(fetcher.matches(&Url::parse("https://a.example.com/hc/en-us/articles/1-a").unwrap()));
        assert!(!fetcher.matches(&Url::parse("https://example.com/blog/1").unwrap()));
    }
}
