//! Headless browser fetcher
//!
//! Launches a fresh headless Chromium per request, renders the page and
//! returns the resulting DOM as HTML. Launch, render and teardown all fit
//! inside the render timeout; a few seconds of it are reserved so a hung
//! browser can still be closed or killed on every exit path.

use crate::error::FetchError;
use crate::fetchers::PageSource;
use crate::options::ScrapeOptions;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetBlockedUrLsParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

const BACKEND: &str = "headless browser";

/// Heavy assets that never contribute text
const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.svg", "*.webp", "*.woff", "*.woff2", "*.ttf", "*.eot",
];

/// Hides the most common headless fingerprints before any page script runs
const STEALTH_JS: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    window.chrome = { runtime: {} };
"#;

const RESOURCE_COUNT_JS: &str = "performance.getEntriesByType('resource').length";

/// Interval between network-activity polls
const QUIET_POLL: Duration = Duration::from_millis(250);

/// Consecutive unchanged polls that count as network idle
const QUIET_POLLS: usize = 2;

/// Upper bound on the part of the render timeout kept for teardown
const TEARDOWN_GRACE: Duration = Duration::from_secs(3);

/// Headless Chromium fetcher
pub struct RenderFetcher {
    stealth: bool,
}

impl RenderFetcher {
    /// Create a render fetcher, optionally injecting the stealth script
    pub fn new(stealth: bool) -> Self {
        Self { stealth }
    }

    /// Returns true if a browser executable can be found.
    pub fn probe(chrome_executable: Option<&Path>) -> bool {
        match chrome_executable {
            Some(path) => path.exists(),
            None => BrowserConfig::builder().build().is_ok(),
        }
    }

    fn config(options: &ScrapeOptions) -> Result<BrowserConfig, FetchError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 800)
            .request_timeout(options.render_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", options.user_agent));

        if let Some(ref path) = options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(|e| FetchError::backend(BACKEND, e))
    }
}

#[async_trait]
impl PageSource for RenderFetcher {
    fn name(&self) -> &'static str {
        "render"
    }

    async fn fetch_html(&self, url: &str, options: &ScrapeOptions) -> Result<String, FetchError> {
        let config = Self::config(options)?;
        render_within_timeout(BrowserSession::launch(config), url, options, self.stealth).await
    }
}

/// Split the render timeout into working time and teardown time
fn split_budget(total: Duration) -> (Duration, Duration) {
    let grace = TEARDOWN_GRACE.min(total / 4);
    (total - grace, grace)
}

/// Launch, render and tear down, all within `options.render_timeout`.
///
/// Launch and render share the working part of the budget. Teardown always
/// runs once a session exists and is bounded by the remainder.
async fn render_within_timeout<S, L>(
    launch: L,
    url: &str,
    options: &ScrapeOptions,
    stealth: bool,
) -> Result<String, FetchError>
where
    S: RenderSession,
    L: Future<Output = Result<S, FetchError>>,
{
    let (work, grace) = split_budget(options.render_timeout);
    let deadline = Instant::now() + work;

    let mut session = tokio::time::timeout_at(deadline, launch)
        .await
        .map_err(|_| FetchError::Timeout(options.render_timeout))??;

    let rendered = tokio::time::timeout_at(deadline, session.render(url, options, stealth)).await;

    teardown(&mut session, grace).await;

    match rendered {
        Ok(result) => result,
        Err(_) => {
            warn!(url = %url, "Render timed out");
            Err(FetchError::Timeout(options.render_timeout))
        }
    }
}

/// Close gracefully, falling back to a kill. Returns within `grace`.
async fn teardown<S: RenderSession>(session: &mut S, grace: Duration) {
    let start = Instant::now();
    let deadline = start + grace;

    match tokio::time::timeout_at(start + grace / 2, session.close()).await {
        Ok(Ok(())) => {
            debug!("Headless browser closed");
            return;
        }
        Ok(Err(e)) => debug!(error = %e, "Browser close failed, killing process"),
        Err(_) => warn!("Browser close timed out, killing process"),
    }

    if tokio::time::timeout_at(deadline, session.kill()).await.is_err() {
        warn!("Browser kill timed out, leaving it to kill-on-drop");
    }
}

/// A launched browser that can render one page and be shut down
#[async_trait]
trait RenderSession: Send + Sync {
    /// Load `url` and return the rendered DOM
    async fn render(&self, url: &str, options: &ScrapeOptions, stealth: bool) -> Result<String, FetchError>;

    /// Ask the browser to exit and wait for the process
    async fn close(&mut self) -> Result<(), FetchError>;

    /// Kill the browser process
    async fn kill(&mut self);
}

/// A running browser plus the task driving its CDP connection
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(config: BrowserConfig) -> Result<Self, FetchError> {
        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_error)?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        debug!("Launched headless browser");
        Ok(Self { browser, handler })
    }
}

#[async_trait]
impl RenderSession for BrowserSession {
    async fn render(&self, url: &str, options: &ScrapeOptions, stealth: bool) -> Result<String, FetchError> {
        let page = self.browser.new_page("about:blank").await.map_err(cdp_error)?;

        let blocked: Vec<String> = BLOCKED_URL_PATTERNS.iter().map(|p| p.to_string()).collect();
        page.execute(SetBlockedUrLsParams::new(blocked))
            .await
            .map_err(cdp_error)?;

        if stealth {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_JS))
                .await
                .map_err(cdp_error)?;
        }

        page.goto(url).await.map_err(cdp_error)?;
        wait_for_network_quiet(&page).await;
        tokio::time::sleep(options.settle_delay).await;

        page.content().await.map_err(cdp_error)
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.browser.close().await.map_err(cdp_error)?;
        self.browser
            .wait()
            .await
            .map_err(|e| FetchError::backend(BACKEND, e.to_string()))?;
        Ok(())
    }

    async fn kill(&mut self) {
        let _ = self.browser.kill().await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // The child process is spawned kill-on-drop; the CDP task is not
        self.handler.abort();
    }
}

/// Poll until the page stops requesting resources.
///
/// Bounded by the caller's render deadline.
async fn wait_for_network_quiet(page: &Page) {
    let mut last = None;
    let mut stable = 0;

    while stable < QUIET_POLLS {
        tokio::time::sleep(QUIET_POLL).await;
        let count = match page.evaluate(RESOURCE_COUNT_JS).await {
            Ok(result) => result.into_value::<u64>().ok(),
            Err(_) => None,
        };

        if count.is_some() && count == last {
            stable += 1;
        } else {
            stable = 0;
        }
        last = count;
    }
}

fn cdp_error(err: chromiumoxide::error::CdpError) -> FetchError {
    FetchError::backend(BACKEND, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Timers fire on millisecond ticks
    const TIMER_SLACK: Duration = Duration::from_millis(1);

    #[test]
    fn test_probe_missing_executable() {
        assert!(!RenderFetcher::probe(Some(Path::new("/nonexistent/chromium"))));
    }

    #[test]
    fn test_render_name() {
        assert_eq!(RenderFetcher::new(true).name(), "render");
    }

    #[test]
    fn test_split_budget() {
        assert_eq!(
            split_budget(Duration::from_secs(30)),
            (Duration::from_secs(27), Duration::from_secs(3))
        );
        assert_eq!(
            split_budget(Duration::from_secs(4)),
            (Duration::from_secs(3), Duration::from_secs(1))
        );
    }

    #[derive(Clone, Copy)]
    enum Step {
        Ok,
        Fail,
        Hang,
    }

    /// Scripted session recording which calls were made
    struct FakeSession {
        render: Step,
        close: Step,
        kill: Step,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl FakeSession {
        fn new(render: Step, close: Step, kill: Step) -> (Self, Arc<Mutex<Vec<&'static str>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let session = Self {
                render,
                close,
                kill,
                calls: calls.clone(),
            };
            (session, calls)
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl RenderSession for FakeSession {
        async fn render(&self, _url: &str, _options: &ScrapeOptions, _stealth: bool) -> Result<String, FetchError> {
            self.record("render");
            match self.render {
                Step::Ok => Ok("<p>rendered</p>".to_string()),
                Step::Fail => Err(FetchError::backend(BACKEND, "navigation failed")),
                Step::Hang => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> Result<(), FetchError> {
            self.record("close");
            match self.close {
                Step::Ok => Ok(()),
                Step::Fail => Err(FetchError::backend(BACKEND, "connection closed")),
                Step::Hang => std::future::pending().await,
            }
        }

        async fn kill(&mut self) {
            self.record("kill");
            if let Step::Hang = self.kill {
                std::future::pending::<()>().await;
            }
        }
    }

    fn options(render_timeout: Duration) -> ScrapeOptions {
        ScrapeOptions {
            render_timeout,
            ..ScrapeOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_then_clean_close() {
        let (session, calls) = FakeSession::new(Step::Ok, Step::Ok, Step::Ok);
        let html = render_within_timeout(
            async { Ok(session) },
            "https://x.com",
            &options(Duration::from_secs(30)),
            true,
        )
        .await
        .unwrap();

        assert_eq!(html, "<p>rendered</p>");
        assert_eq!(*calls.lock().unwrap(), vec!["render", "close"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_failure_still_tears_down() {
        let (session, calls) = FakeSession::new(Step::Fail, Step::Fail, Step::Ok);
        let err = render_within_timeout(
            async { Ok(session) },
            "https://x.com",
            &options(Duration::from_secs(30)),
            false,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("navigation failed"));
        assert_eq!(*calls.lock().unwrap(), vec!["render", "close", "kill"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_browser_stays_within_timeout() {
        let (session, calls) = FakeSession::new(Step::Hang, Step::Hang, Step::Hang);
        let timeout = Duration::from_secs(30);
        let start = Instant::now();

        let err = render_within_timeout(async { Ok(session) }, "https://x.com", &options(timeout), true)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout(t) if t == timeout));
        assert!(start.elapsed() <= timeout + TIMER_SLACK);
        assert_eq!(*calls.lock().unwrap(), vec!["render", "close", "kill"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_close_is_killed_within_grace() {
        let (mut session, calls) = FakeSession::new(Step::Ok, Step::Hang, Step::Ok);
        let start = Instant::now();

        teardown(&mut session, Duration::from_secs(4)).await;

        assert!(start.elapsed() <= Duration::from_secs(4) + TIMER_SLACK);
        assert_eq!(*calls.lock().unwrap(), vec!["close", "kill"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_launch_times_out() {
        let timeout = Duration::from_secs(10);
        let start = Instant::now();

        let launch = std::future::pending::<Result<FakeSession, FetchError>>();
        let err = render_within_timeout(launch, "https://x.com", &options(timeout), true)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout(_)));
        assert!(start.elapsed() <= timeout + TIMER_SLACK);
    }
}
