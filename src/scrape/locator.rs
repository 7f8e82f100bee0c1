//! Listing location: find item containers in a rendered search-results
//! page and resolve one price per item.
//!
//! Marketplace markup drifts, so both the container and the price
//! sub-element are described by ordered fallback selector lists. The first
//! container selector that yields any elements wins the pass; per item, the
//! first price selector whose text parses wins, falling back to the item's
//! full visible text. Items that resolve nothing are skipped silently;
//! partial extraction is expected, not an error.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::extract::extract_price;

/// Result of one locate pass over a page snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Prices resolved this pass, in listing order.
    pub prices: Vec<u32>,
    /// Number of items examined this pass (priced or not), so the caller
    /// can skip them on the next pass.
    pub examined: usize,
}

/// Run one pass over a snapshot: locate containers, skip the first
/// `already_examined` items, and resolve at most `limit` new prices.
pub fn collect_prices(
    html: &str,
    config: &SiteConfig,
    already_examined: usize,
    limit: usize,
) -> PassOutcome {
    let document = Html::parse_document(html);

    for selector_str in &config.item_container_selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(selector) => selector,
            Err(err) => {
                warn!(selector = %selector_str, ?err, "skipping invalid container selector");
                continue;
            }
        };

        let items: Vec<ElementRef> = document.select(&selector).collect();
        if items.is_empty() {
            continue;
        }

        debug!(selector = %selector_str, candidates = items.len(), "located listing containers");
        return resolve_items(&items, config, already_examined, limit);
    }

    PassOutcome::default()
}

fn resolve_items(
    items: &[ElementRef],
    config: &SiteConfig,
    already_examined: usize,
    limit: usize,
) -> PassOutcome {
    let mut outcome = PassOutcome::default();

    // Items are skipped by count; container order is assumed stable across
    // scroll passes within one session.
    for item in items.iter().skip(already_examined) {
        if outcome.prices.len() >= limit {
            break;
        }
        outcome.examined += 1;
        if let Some(price) = resolve_price(*item, config) {
            outcome.prices.push(price);
        }
    }

    outcome
}

/// Resolve a price for one item: price-inner selectors in order, then the
/// item's full text.
fn resolve_price(item: ElementRef, config: &SiteConfig) -> Option<u32> {
    for selector_str in &config.price_inner_selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            warn!(selector = %selector_str, "skipping invalid price selector");
            continue;
        };
        if let Some(inner) = item.select(&selector).next() {
            if let Some(price) = extract_price(&element_text(inner)) {
                return Some(price);
            }
        }
    }

    extract_price(&element_text(item))
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(containers: &[&str], prices: &[&str]) -> SiteConfig {
        SiteConfig {
            url_template: "https://example.jp/s?q={keyword}".to_string(),
            item_container_selectors: containers.iter().map(|s| s.to_string()).collect(),
            price_inner_selectors: prices.iter().map(|s| s.to_string()).collect(),
            max_items_to_scrape: 20,
            wait_time_after_load: (0.0, 0.0),
            scroll_count: (1, 3),
            scroll_height: (300, 700),
            scroll_wait_time: (0.0, 0.0),
            listing_wait_secs: 0,
        }
    }

    const PAGE: &str = r#"
        <ul>
          <li class="item"><span class="price">¥1,000</span><p>Supreme cap</p></li>
          <li class="item"><span class="price">¥2,000</span><p>Stussy tee</p></li>
          <li class="item"><span class="price">no price</span><p>mystery box</p></li>
        </ul>
    "#;

    #[test]
    fn test_resolves_prices_and_skips_unresolvable() {
        let outcome = collect_prices(PAGE, &config(&[".item"], &[".price"]), 0, 20);
        assert_eq!(outcome.prices, vec![1000, 2000]);
        assert_eq!(outcome.examined, 3);
    }

    #[test]
    fn test_first_nonempty_container_selector_wins() {
        let cfg = config(&[".missing", ".item"], &[".price"]);
        let outcome = collect_prices(PAGE, &cfg, 0, 20);
        assert_eq!(outcome.prices, vec![1000, 2000]);
    }

    #[test]
    fn test_price_selector_fallback_order() {
        let html = r#"
            <div class="item">
              <span class="new-price">¥3,500</span>
            </div>
        "#;
        // The preferred selector misses; the second resolves.
        let cfg = config(&[".item"], &[".old-price", ".new-price"]);
        let outcome = collect_prices(html, &cfg, 0, 20);
        assert_eq!(outcome.prices, vec![3500]);
    }

    #[test]
    fn test_falls_back_to_full_item_text() {
        let html = r#"<div class="item">Stussy hoodie 4,980円 used</div>"#;
        let cfg = config(&[".item"], &[".price"]);
        let outcome = collect_prices(html, &cfg, 0, 20);
        assert_eq!(outcome.prices, vec![4980]);
    }

    #[test]
    fn test_limit_stops_examination() {
        let outcome = collect_prices(PAGE, &config(&[".item"], &[".price"]), 0, 1);
        assert_eq!(outcome.prices, vec![1000]);
        assert_eq!(outcome.examined, 1);
    }

    #[test]
    fn test_already_examined_items_are_skipped() {
        let outcome = collect_prices(PAGE, &config(&[".item"], &[".price"]), 2, 20);
        // Only the third (unpriced) item remains.
        assert_eq!(outcome.prices, Vec::<u32>::new());
        assert_eq!(outcome.examined, 1);
    }

    #[test]
    fn test_invalid_selector_falls_through() {
        let cfg = config(&["[[[", ".item"], &["(((", ".price"]);
        let outcome = collect_prices(PAGE, &cfg, 0, 20);
        assert_eq!(outcome.prices, vec![1000, 2000]);
    }

    #[test]
    fn test_no_containers_yields_empty() {
        let outcome = collect_prices(PAGE, &config(&[".nothing"], &[".price"]), 0, 20);
        assert_eq!(outcome, PassOutcome::default());
    }

    #[test]
    fn test_duplicate_prices_retained() {
        let html = r#"
            <div class="item"><span class="price">¥1,000</span></div>
            <div class="item"><span class="price">¥1,000</span></div>
        "#;
        let outcome = collect_prices(html, &config(&[".item"], &[".price"]), 0, 20);
        assert_eq!(outcome.prices, vec![1000, 1000]);
    }
}
