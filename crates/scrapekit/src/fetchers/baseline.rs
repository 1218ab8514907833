//! Baseline HTTP fetcher
//!
//! Plain GET with browser-like headers. The body is kept whatever the
//! status code: error pages from paywalls and CDNs often still carry the
//! full article.

use crate::error::FetchError;
use crate::fetchers::PageSource;
use crate::options::ScrapeOptions;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};

/// Binary content type prefixes
const BINARY_PREFIXES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "application/octet-stream",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-tar",
    "application/x-rar",
    "application/x-7z",
    "application/vnd.ms-",
    "application/vnd.openxmlformats",
    "font/",
];

/// Accept header sent by desktop Chrome for page navigations
pub(crate) const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Accept-Language header
pub(crate) const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Baseline HTTP fetcher
pub struct BaselineFetcher;

impl BaselineFetcher {
    /// Create a new baseline fetcher
    pub fn new() -> Self {
        Self
    }
}

impl Default for BaselineFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for BaselineFetcher {
    fn name(&self) -> &'static str {
        "baseline"
    }

    async fn fetch_html(&self, url: &str, options: &ScrapeOptions) -> Result<String, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent_header(&options.user_agent));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(options.http_timeout)
            .timeout(options.http_timeout)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, options.http_timeout))?;

        read_html(response, options.http_timeout).await
    }
}

/// Header value for a configured User-Agent, falling back to the default
pub(crate) fn user_agent_header(user_agent: &str) -> HeaderValue {
    HeaderValue::from_str(user_agent).unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT))
}

/// Read a response as HTML text, whatever its status.
///
/// Binary responses are rejected. A body cut short by the timeout or a
/// dropped connection is returned as-is if any bytes arrived; otherwise
/// the failure is an error.
pub(crate) async fn read_html(response: reqwest::Response, timeout: Duration) -> Result<String, FetchError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    if let Some(ref ct) = content_type {
        if is_binary_content_type(ct) {
            return Err(FetchError::RequestError(format!(
                "Unsupported content type: {ct}"
            )));
        }
    }

    if !status.is_success() {
        debug!(status = status.as_u16(), "Keeping body of error response");
    }

    let (body, truncated) = read_body_with_timeout(response, timeout).await?;
    if truncated {
        debug!(bytes = body.len(), "Keeping partial body");
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Check if content type indicates binary content
fn is_binary_content_type(content_type: &str) -> bool {
    let ct_lower = content_type.to_lowercase();
    BINARY_PREFIXES
        .iter()
        .any(|prefix| ct_lower.starts_with(prefix))
}

/// Read the response body until it ends, fails or the deadline passes.
///
/// Returns the bytes read and whether the body was cut short. Fails only
/// when nothing at all was received.
async fn read_body_with_timeout(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<(Bytes, bool), FetchError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        tokio::select! {
            chunk = stream.next() => {
                match chunk {
                    Some(Ok(bytes)) => body.extend_from_slice(&bytes),
                    Some(Err(e)) if body.is_empty() => {
                        return Err(FetchError::from_reqwest(e, timeout));
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, bytes = body.len(), "Body read failed, keeping partial content");
                        return Ok((Bytes::from(body), true));
                    }
                    None => return Ok((Bytes::from(body), false)),
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                if body.is_empty() {
                    return Err(FetchError::Timeout(timeout));
                }
                warn!(bytes = body.len(), "Body timeout reached, keeping partial content");
                return Ok((Bytes::from(body), true));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_is_binary_content_type() {
        assert!(is_binary_content_type("image/png"));
        assert!(is_binary_content_type("application/pdf"));
        assert!(is_binary_content_type("application/octet-stream"));
        assert!(is_binary_content_type("application/vnd.ms-excel"));
        assert!(is_binary_content_type("font/woff2"));

        assert!(!is_binary_content_type("text/html; charset=utf-8"));
        assert!(!is_binary_content_type("application/xhtml+xml"));
        assert!(!is_binary_content_type("text/plain"));
    }

    #[test]
    fn test_user_agent_header_fallback() {
        assert_eq!(user_agent_header("Custom/1.0"), "Custom/1.0");
        assert_eq!(user_agent_header("bad\nagent"), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_baseline_name() {
        assert_eq!(BaselineFetcher::new().name(), "baseline");
    }

    /// Serve one connection: wait for the request, write `response`, close.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/", addr)
    }

    fn truncated_response(body: &str) -> Vec<u8> {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5000\r\n\r\n{}",
            body
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn test_connection_dropped_before_body_is_error() {
        let url = serve_once(truncated_response("")).await;
        let result = BaselineFetcher::new()
            .fetch_html(&url, &ScrapeOptions::default())
            .await;
        assert!(result.is_err(), "expected error, got {:?}", result);
    }

    #[tokio::test]
    async fn test_connection_dropped_mid_body_keeps_partial() {
        let url = serve_once(truncated_response("<html><body><p>partial article</p>")).await;
        let html = BaselineFetcher::new()
            .fetch_html(&url, &ScrapeOptions::default())
            .await
            .unwrap();
        assert_eq!(html, "<html><body><p>partial article</p>");
    }

    #[tokio::test]
    async fn test_complete_body_with_error_status() {
        let body = "<html><body><p>still here</p></body></html>";
        let response = format!(
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let url = serve_once(response.into_bytes()).await;
        let html = BaselineFetcher::new()
            .fetch_html(&url, &ScrapeOptions::default())
            .await
            .unwrap();
        assert_eq!(html, body);
    }
}
