//! Optional backend availability
//!
//! Capabilities are probed once at startup and then passed by value to
//! whatever needs them. A layer whose capability is false is skipped.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which optional fetch backends are available in this process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Capabilities {
    /// Cookie-persisting challenge-bypass client
    pub challenge_bypass: bool,
    /// Headless browser renderer
    pub headless_browser: bool,
    /// Anti-detection patches for the renderer
    pub stealth: bool,
}

impl Capabilities {
    /// No optional backends
    pub fn none() -> Self {
        Self::default()
    }

    /// Probe compiled features and the local browser installation.
    pub fn detect() -> Self {
        Self::detect_with(None)
    }

    /// Probe, using `chrome_executable` instead of auto-detection if given.
    pub fn detect_with(chrome_executable: Option<&Path>) -> Self {
        let challenge_bypass = cfg!(feature = "bypass");
        let headless_browser = probe_browser(chrome_executable);
        let stealth = cfg!(feature = "stealth") && headless_browser;

        let caps = Self {
            challenge_bypass,
            headless_browser,
            stealth,
        };
        tracing::debug!(?caps, "Detected scraping capabilities");
        caps
    }

    /// Returns true if any escalation layer can run
    pub fn any(&self) -> bool {
        self.challenge_bypass || self.headless_browser
    }
}

#[cfg(feature = "render")]
fn probe_browser(chrome_executable: Option<&Path>) -> bool {
    crate::fetchers::RenderFetcher::probe(chrome_executable)
}

#[cfg(not(feature = "render"))]
fn probe_browser(_chrome_executable: Option<&Path>) -> bool {
    false
}
