//! Batch runner: sequential scrape-and-save over the whole taxonomy.
//!
//! Strictly one target at a time: parallel sessions would amplify the
//! anti-scraping risk the pacing pauses exist to mitigate. A target that
//! fails or yields nothing never aborts the run.

use std::fmt;

use tracing::{info, warn};

use crate::brands::BrandBook;
use crate::config::Settings;
use crate::pacing::Pacing;
use crate::scrape::Orchestrator;
use crate::store::StatsStore;

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Targets processed.
    pub targets: usize,
    /// Targets whose statistics were saved.
    pub saved: usize,
    /// Targets that produced zero prices.
    pub empty: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} targets processed, {} saved, {} empty",
            self.targets, self.saved, self.empty
        )
    }
}

/// Sequentially processes every (site, category, brand) tuple.
pub struct BatchRunner<'a> {
    orchestrator: Orchestrator<'a>,
    store: &'a StatsStore,
    settings: &'a Settings,
    pacing: Pacing,
}

impl<'a> BatchRunner<'a> {
    pub fn new(orchestrator: Orchestrator<'a>, store: &'a StatsStore, settings: &'a Settings) -> Self {
        Self {
            orchestrator,
            store,
            settings,
            pacing: Pacing::jittered(),
        }
    }

    /// Replace the pacing policy (tests inject a zero-delay one).
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run every configured target, one at a time: scrape, then save,
    /// then pace before the next. Designed for unattended execution;
    /// nothing below this boundary propagates.
    pub async fn run(&self, brands: &BrandBook) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut first_site = true;

        for (site, categories) in &brands.sites {
            if !first_site {
                self.pacing.pause_secs(self.settings.site_pause).await;
            }
            first_site = false;

            let mut first_brand = true;
            for (category, brand_list) in categories {
                for brand in brand_list {
                    if !first_brand {
                        self.pacing.pause_secs(self.settings.brand_pause).await;
                    }
                    first_brand = false;
                    summary.targets += 1;

                    info!(%site, %category, %brand, "scraping target");
                    let prices = self.orchestrator.scrape(site, brand, None).await;

                    if prices.is_empty() {
                        warn!(%site, %brand, "no prices found; nothing saved");
                        summary.empty += 1;
                        continue;
                    }

                    match self.store.save(site, brand, &prices) {
                        Ok(_) => summary.saved += 1,
                        Err(err) => warn!(%err, %site, %brand, "failed to save daily statistics"),
                    }
                }
            }
        }

        info!(%summary, "batch run finished");
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[tokio::test]
    async fn test_unconfigured_sites_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let sites = BTreeMap::new(); // no site configs at all
        let store = StatsStore::new(dir.path().join("data")).unwrap();

        let mut book = BrandBook::default();
        book.sites.insert(
            "nowhere".to_string(),
            BTreeMap::from([("misc".to_string(), vec!["Supreme".to_string(), "Stussy".to_string()])]),
        );

        let orchestrator = Orchestrator::new(&settings, &sites).with_pacing(Pacing::disabled());
        let runner = BatchRunner::new(orchestrator, &store, &settings).with_pacing(Pacing::disabled());
        let summary = runner.run(&book).await;

        assert_eq!(summary.targets, 2);
        assert_eq!(summary.saved, 0);
        assert_eq!(summary.empty, 2);
    }

    #[tokio::test]
    async fn test_empty_book_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let sites = BTreeMap::new();
        let store = StatsStore::new(dir.path().join("data")).unwrap();

        let orchestrator = Orchestrator::new(&settings, &sites).with_pacing(Pacing::disabled());
        let runner = BatchRunner::new(orchestrator, &store, &settings).with_pacing(Pacing::disabled());
        let summary = runner.run(&BrandBook::default()).await;

        assert_eq!(summary, RunSummary::default());
    }
}
