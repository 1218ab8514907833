//! Error types for ScrapeKit

use crate::capabilities::Capabilities;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a single fetch layer
///
/// These never reach the caller directly: the pipeline treats them as
/// escalation signals and keeps the message as the failure detail.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request exceeded the layer timeout
    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Optional backend (browser, bypass client) failed
    #[error("{backend} failed: {message}")]
    BackendError {
        backend: &'static str,
        message: String,
    },

    /// Site content API returned something unusable
    #[error("Site API error: {0}")]
    SiteApiError(String),
}

impl FetchError {
    /// Create an error from a reqwest error
    ///
    /// The request URL is dropped so that failure details only describe
    /// the cause.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else {
            FetchError::RequestError(error_chain(&err))
        }
    }

    /// Message plus every underlying cause, for failure details
    pub fn detail(&self) -> String {
        error_chain(self)
    }

    /// Create a backend failure
    pub fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        FetchError::BackendError {
            backend,
            message: message.into(),
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// Terminal failure: no layer obtained any HTML for the URL
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct ScrapeError {
    /// URL as requested (after normalization)
    pub url: String,
    /// Human-readable cause
    pub detail: String,
    /// Backends available when the failure happened
    pub capabilities: Capabilities,
}

impl ScrapeError {
    /// Create a terminal failure
    pub fn new(url: impl Into<String>, detail: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            url: url.into(),
            detail: detail.into(),
            capabilities,
        }
    }
}
