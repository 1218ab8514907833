//! Content classification signals that drive escalation
//!
//! Two signals decide whether the fetch chain moves on to the next layer:
//! the raw page looks like an anti-bot interstitial, or the extracted
//! article is too short to be real content (typically a JavaScript shell).

use scraper::Html;

/// Minimum word count for extracted content to count as a real article
pub const THIN_CONTENT_THRESHOLD: usize = 50;

/// Average reading speed used for reading-time estimates
pub const WORDS_PER_MINUTE: usize = 225;

/// Interstitial markers matched verbatim
const CHALLENGE_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "challenge-platform",
    "Just a moment...",
    "Checking your browser",
    "cf_chl_opt",
];

/// Interstitial markers matched case-insensitively (must be lowercase)
const CHALLENGE_MARKERS_NOCASE: &[&str] = &[
    "checking your browser before accessing",
    "verify you are human",
    "captcha-delivery.com",
    "px-captcha",
    "ddos-guard",
];

/// Count words in an HTML fragment.
///
/// Tags are stripped, entities decoded, and the remaining text split on
/// whitespace.
pub fn count_words(html: &str) -> usize {
    if html.trim().is_empty() {
        return 0;
    }

    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .count()
}

/// Estimated reading time in minutes, never less than one.
pub fn reading_time_minutes(word_count: usize, wpm: usize) -> usize {
    if wpm == 0 {
        return 1;
    }
    ((word_count as f64 / wpm as f64).round() as usize).max(1)
}

/// Returns true if the raw page is an anti-automation interstitial.
pub fn is_bot_challenge(html: &str) -> bool {
    if CHALLENGE_MARKERS.iter().any(|marker| html.contains(marker)) {
        return true;
    }

    let lower = html.to_lowercase();
    CHALLENGE_MARKERS_NOCASE
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Returns true if extracted content has fewer than `threshold` words.
pub fn is_thin(content_html: &str, threshold: usize) -> bool {
    count_words(content_html) < threshold
}
