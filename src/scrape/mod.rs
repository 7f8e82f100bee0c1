//! Site scrape orchestration.
//!
//! The orchestrator drives one page session through scroll-and-extract
//! passes until the target item count is reached or the scroll budget is
//! exhausted, and absorbs every failure at its boundary: callers always
//! get back whatever prices were collected, possibly none.

pub mod locator;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::{Settings, SiteConfig};
use crate::error::SessionError;
use crate::pacing::{sample_u32, Pacing};
use locator::{collect_prices, PassOutcome};

/// Poll interval while waiting for the first listings to render.
const LISTING_POLL: Duration = Duration::from_millis(500);

/// The page operations the orchestrator needs: scroll and snapshot.
///
/// The browser session implements this for live pages; tests drive the
/// pass logic with canned HTML.
#[async_trait]
pub trait PageSource: Sync {
    /// Scroll the viewport down by `px` pixels.
    async fn scroll_by(&self, px: u32) -> Result<(), SessionError>;

    /// Snapshot the current DOM as HTML.
    async fn html(&self) -> Result<String, SessionError>;
}

/// Drives scrapes for configured sites.
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    sites: &'a BTreeMap<String, SiteConfig>,
    pacing: Pacing,
}

impl<'a> Orchestrator<'a> {
    pub fn new(settings: &'a Settings, sites: &'a BTreeMap<String, SiteConfig>) -> Self {
        Self {
            settings,
            sites,
            pacing: Pacing::jittered(),
        }
    }

    /// Replace the pacing policy (tests inject a zero-delay one).
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Scrape one (site, keyword) target and return the prices found.
    ///
    /// Never fails: an unknown site, an unavailable session, a navigation
    /// timeout, or any mid-scrape error all degrade to whatever was
    /// collected before the failure.
    #[cfg(feature = "browser")]
    pub async fn scrape(
        &self,
        site: &str,
        keyword: &str,
        max_items_override: Option<usize>,
    ) -> Vec<u32> {
        use crate::browser::BrowserSession;

        let Some(config) = self.sites.get(site) else {
            warn!(site, "no configuration for site");
            return Vec::new();
        };
        let max_items = max_items_override.unwrap_or(config.max_items_to_scrape);
        let url = config.search_url(keyword);

        let session = match BrowserSession::launch(&self.settings.user_agent).await {
            Ok(session) => session,
            Err(err) => {
                warn!(%err, site, keyword, "browser session unavailable");
                return Vec::new();
            }
        };

        info!(site, keyword, %url, "loading search results");
        let timeout = Duration::from_secs(self.settings.page_load_timeout);
        let prices = match session.goto(&url, timeout).await {
            Ok(()) => self.run_passes(&session, config, max_items).await,
            Err(err) => {
                warn!(%err, site, keyword, "navigation failed");
                Vec::new()
            }
        };
        session.close().await;

        info!(site, keyword, collected = prices.len(), "scrape finished");
        prices
    }

    /// Stub used when built without browser automation.
    #[cfg(not(feature = "browser"))]
    pub async fn scrape(
        &self,
        site: &str,
        keyword: &str,
        _max_items_override: Option<usize>,
    ) -> Vec<u32> {
        warn!(site, keyword, "built without the `browser` feature; no session available");
        Vec::new()
    }

    /// The pass loop: settle, wait for listings, then scroll-and-extract
    /// until `max_items` prices are collected or the scroll budget runs
    /// out. Snapshot failures skip the pass, never the scrape.
    pub async fn run_passes<P: PageSource + ?Sized>(
        &self,
        page: &P,
        config: &SiteConfig,
        max_items: usize,
    ) -> Vec<u32> {
        if max_items == 0 {
            return Vec::new();
        }

        self.pacing.pause_secs(config.wait_time_after_load).await;

        let mut prices: Vec<u32> = Vec::new();
        let mut examined = 0usize;

        // Initial pre-scroll pass. Client-side rendering can lag the load
        // event, so poll until containers appear or the wait bound lapses.
        let deadline = Instant::now() + self.pacing.scale(Duration::from_secs(config.listing_wait_secs));
        loop {
            let outcome = self.one_pass(page, config, examined, max_items - prices.len()).await;
            examined += outcome.examined;
            prices.extend(outcome.prices);
            if examined > 0 || Instant::now() >= deadline {
                break;
            }
            sleep(LISTING_POLL).await;
        }

        let scroll_budget = config.scroll_count.1;
        for pass in 0..scroll_budget {
            if prices.len() >= max_items {
                break;
            }

            let height = sample_u32(config.scroll_height);
            if let Err(err) = page.scroll_by(height).await {
                warn!(%err, "scroll failed; ending scrape");
                break;
            }
            self.pacing.pause_secs(config.scroll_wait_time).await;

            let outcome = self.one_pass(page, config, examined, max_items - prices.len()).await;
            if outcome.examined == 0 {
                debug!(pass, "unproductive scroll pass");
            }
            examined += outcome.examined;
            prices.extend(outcome.prices);
        }

        prices.truncate(max_items);
        prices
    }

    async fn one_pass<P: PageSource + ?Sized>(
        &self,
        page: &P,
        config: &SiteConfig,
        examined: usize,
        limit: usize,
    ) -> PassOutcome {
        match page.html().await {
            Ok(html) => collect_prices(&html, config, examined, limit),
            Err(err) => {
                warn!(%err, "page snapshot failed; skipping pass");
                PassOutcome::default()
            }
        }
    }
}
