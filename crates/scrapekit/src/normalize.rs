//! URL normalization and domain extraction

use url::Url;

/// Scheme prefix used by browser reader views to wrap the real page URL
const READER_PREFIX: &str = "about:reader?";

/// Unwrap reader-mode URLs, leaving anything else as-is.
///
/// `about:reader?url=https%3A%2F%2Fexample.com%2Fa` becomes
/// `https://example.com/a`. A wrapper without a usable `url` parameter is
/// returned unchanged.
pub fn normalize(url: &str) -> String {
    let trimmed = url.trim();

    let Some(query) = trimmed.strip_prefix(READER_PREFIX) else {
        return trimmed.to_string();
    };

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Lowercased host of `url` without a leading `www.`, or empty on failure.
pub fn extract_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_url_unchanged() {
        assert_eq!(
            normalize("https://example.com/a?b=c"),
            "https://example.com/a?b=c"
        );
    }

    #[test]
    fn test_normalize_reader_url() {
        assert_eq!(
            normalize("about:reader?url=https%3A%2F%2Fwww.example.com%2Fpost%3Fid%3D7"),
            "https://www.example.com/post?id=7"
        );
    }

    #[test]
    fn test_normalize_reader_url_extra_params() {
        assert_eq!(
            normalize("about:reader?foo=1&url=https%3A%2F%2Fexample.com%2F"),
            "https://example.com/"
        );
    }

    #[test]
    fn test_normalize_malformed_reader_url_passes_through() {
        assert_eq!(normalize("about:reader?foo=bar"), "about:reader?foo=bar");
        assert_eq!(normalize("about:reader?url="), "about:reader?url=");
        assert_eq!(normalize("about:reader?"), "about:reader?");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize("  https://example.com/  "), "https://example.com/");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.nytimes.com/article"), "nytimes.com");
        assert_eq!(extract_domain("https://news.ycombinator.com/item?id=1"), "news.ycombinator.com");
        assert_eq!(extract_domain("http://WWW.Example.COM:8080/x"), "example.com");
    }

    #[test]
    fn test_extract_domain_only_strips_leading_www() {
        assert_eq!(extract_domain("https://wwwx.example.com/"), "wwwx.example.com");
        assert_eq!(extract_domain("https://blog.www.example.com/"), "blog.www.example.com");
    }

    #[test]
    fn test_extract_domain_invalid() {
        assert_eq!(extract_domain("not a url"), "");
        assert_eq!(extract_domain(""), "");
        assert_eq!(extract_domain("mailto:someone@example.com"), "");
    }
}
