//! End-to-end pipeline test: a synthetic search-results page driven
//! through the orchestrator, the result aggregated and persisted, and the
//! CSV asserted byte-for-byte.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use nefuda::error::SessionError;
use nefuda::{Orchestrator, Pacing, PageSource, SaveOutcome, Settings, SiteConfig, StatsStore};

/// Serves one fixed snapshot; scrolling changes nothing.
struct StaticPage(&'static str);

#[async_trait]
impl PageSource for StaticPage {
    async fn scroll_by(&self, _px: u32) -> Result<(), SessionError> {
        Ok(())
    }

    async fn html(&self) -> Result<String, SessionError> {
        Ok(self.0.to_string())
    }
}

const SITE_A_PAGE: &str = r#"
    <html><body>
      <div class="item"><span class="price">¥1,000</span><span>alpha jacket</span></div>
      <div class="item"><span class="price">¥2,000</span><span>beta jacket</span></div>
      <div class="item"><span class="price">no price</span><span>gamma jacket</span></div>
    </body></html>
"#;

fn site_a() -> SiteConfig {
    SiteConfig {
        url_template: "https://sitea.example/search?q={keyword}".to_string(),
        item_container_selectors: vec![".item".to_string()],
        price_inner_selectors: vec![".price".to_string()],
        max_items_to_scrape: 20,
        wait_time_after_load: (0.0, 0.0),
        scroll_count: (1, 2),
        scroll_height: (300, 700),
        scroll_wait_time: (0.0, 0.0),
        listing_wait_secs: 0,
    }
}

#[tokio::test]
async fn test_scrape_aggregate_persist_round_trip() {
    let settings = Settings::default();
    let mut sites = BTreeMap::new();
    sites.insert("siteA".to_string(), site_a());

    // Scrape: two resolvable prices, one silently skipped item.
    let orchestrator = Orchestrator::new(&settings, &sites).with_pacing(Pacing::disabled());
    let prices = orchestrator.run_passes(&StaticPage(SITE_A_PAGE), &sites["siteA"], 20).await;
    assert_eq!(prices, vec![1000, 2000]);

    // Aggregate and persist.
    let dir = tempfile::tempdir().unwrap();
    let store = StatsStore::new(dir.path().join("data")).unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let outcome = store.save_for_date("siteA", "alpha", &prices, date).unwrap();
    assert_eq!(outcome, SaveOutcome::Inserted);

    // The file the dashboard reads.
    let raw = std::fs::read_to_string(store.path_for("siteA", "alpha")).unwrap();
    assert_eq!(
        raw,
        "date,site,keyword,count,average_price,min_price,max_price\n\
         2025-06-01,siteA,alpha,2,1500.00,1000,2000\n"
    );

    // A rescrape the same day upserts rather than appending.
    let outcome = store.save_for_date("siteA", "alpha", &[3000], date).unwrap();
    assert_eq!(outcome, SaveOutcome::Updated);
    let rows = store.load("siteA", "alpha");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].count, 1);
    assert_eq!(rows[0].average_price, 3000.00);
}
