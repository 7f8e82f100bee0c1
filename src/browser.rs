//! Browser session lifecycle: one headless Chromium session per scrape
//! target, configured to minimize automation fingerprinting.
//!
//! The session is acquired scoped and released on every exit path: callers
//! go through [`BrowserSession::close`], and `Drop` aborts the CDP handler
//! task as a backstop so thousands of per-brand invocations in a batch run
//! cannot leak browser processes.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::scrape::PageSource;

/// Injected before any navigation to suppress the `navigator.webdriver`
/// tell.
const STEALTH_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// An owned headless browser session with one working page.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a headless session that presents as a regular browser.
    pub async fn launch(user_agent: &str) -> Result<Self, SessionError> {
        let config = BrowserConfig::builder()
            .window_size(1920, 1080)
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-blink-features=AutomationControlled",
            ])
            .build()
            .map_err(SessionError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| SessionError::Launch(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(%err, "browser handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(SessionError::Launch(err.to_string()));
            }
        };

        let session = Self {
            browser,
            page,
            handler_task,
        };
        if let Err(err) = session.prepare(user_agent).await {
            session.close().await;
            return Err(err);
        }

        debug!("browser session ready");
        Ok(session)
    }

    /// Set the user agent and install the stealth script before the first
    /// navigation.
    async fn prepare(&self, user_agent: &str) -> Result<(), SessionError> {
        self.page
            .set_user_agent(user_agent)
            .await
            .map_err(|err| SessionError::Launch(err.to_string()))?;
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(|err| SessionError::Launch(err.to_string()))?;
        Ok(())
    }

    /// Navigate under a bounded page-load timeout.
    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<(), SessionError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(SessionError::Navigation(err.to_string())),
            Err(_) => Err(SessionError::NavigationTimeout(timeout.as_secs())),
        }
    }

    /// Tear the session down. Called on every exit path.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            debug!(%err, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        info!("browser session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Backstop for exit paths that bypass close(); the handler task
        // must not outlive the session.
        self.handler_task.abort();
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn scroll_by(&self, px: u32) -> Result<(), SessionError> {
        self.page
            .evaluate(format!("window.scrollBy(0, {px});"))
            .await
            .map(|_| ())
            .map_err(|err| SessionError::Evaluate(err.to_string()))
    }

    async fn html(&self) -> Result<String, SessionError> {
        self.page
            .content()
            .await
            .map_err(|err| SessionError::Snapshot(err.to_string()))
    }
}
