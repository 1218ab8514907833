//! User-facing failure reports
//!
//! Turns a terminal [`ScrapeError`] into a categorized message, a stable
//! error code and a hint about which backend to install next.

use crate::capabilities::Capabilities;
use crate::classify::is_bot_challenge;
use crate::error::ScrapeError;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// URLs embedded in error text; their paths must not drive categorization
static EMBEDDED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:https?|wss?)://[^\s()"'<>]+"#).expect("static regex"));

/// Broad cause of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The site refused the request (HTTP 403 and friends)
    Blocked,
    /// The site did not answer in time
    Timeout,
    /// An anti-bot interstitial was served instead of the page
    BotChallenge,
    /// Anything else
    FetchFailed,
}

impl ErrorCategory {
    /// Classify a failure detail string
    ///
    /// URLs quoted in the detail are ignored.
    pub fn from_detail(detail: &str) -> Self {
        let cause = EMBEDDED_URL.replace_all(detail, "");
        let lower = cause.to_lowercase();
        if lower.contains("403") || lower.contains("forbidden") {
            ErrorCategory::Blocked
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ErrorCategory::Timeout
        } else if lower.contains("challenge") || lower.contains("captcha") || is_bot_challenge(&cause) {
            ErrorCategory::BotChallenge
        } else {
            ErrorCategory::FetchFailed
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::Blocked => "blocked",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::BotChallenge => "bot_challenge",
            ErrorCategory::FetchFailed => "fetch_failed",
        }
    }

    /// Message shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::Blocked => "This site blocked access to the page (403 Forbidden).",
            ErrorCategory::Timeout => "The site took too long to respond.",
            ErrorCategory::BotChallenge => {
                "The site showed a bot-verification page instead of the article."
            }
            ErrorCategory::FetchFailed => "Could not fetch this page.",
        }
    }
}

/// Suggest the next step given which backends are available.
pub fn hint(capabilities: &Capabilities) -> &'static str {
    if !capabilities.challenge_bypass {
        "Enable the challenge-bypass backend (the `bypass` feature) to get past bot-protection pages."
    } else if !capabilities.headless_browser {
        "Install Chrome or Chromium (with the `render` feature) to fetch JavaScript-rendered pages."
    } else {
        "All available fetch methods were attempted. The site may be actively blocking automated access."
    }
}

/// Failure payload returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailureResponse {
    /// Categorized message including the underlying detail
    pub error: String,
    /// Stable category code
    pub error_code: ErrorCategory,
    /// Actionable next step
    pub hint: String,
    /// Backends available at failure time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
}

impl From<&ScrapeError> for FailureResponse {
    fn from(err: &ScrapeError) -> Self {
        let category = ErrorCategory::from_detail(&err.detail);
        Self {
            error: format!("{} {}", category.message(), err.detail),
            error_code: category,
            hint: hint(&err.capabilities).to_string(),
            capabilities: Some(err.capabilities),
        }
    }
}

impl From<ScrapeError> for FailureResponse {
    fn from(err: ScrapeError) -> Self {
        Self::from(&err)
    }
}
