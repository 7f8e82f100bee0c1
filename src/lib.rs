//! nefuda: flea-market price trend tracking pipeline.
//!
//! Scrapes product listing prices for configured brand keywords from
//! marketplace search pages, aggregates each run into daily per-(site,
//! brand) statistics, and persists one CSV time series per target. The
//! dashboard that charts the series is a separate process; it only reads
//! the CSV files and calls [`Orchestrator::scrape`] / [`StatsStore::save`].

pub mod brands;
#[cfg(feature = "browser")]
pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod pacing;
pub mod runner;
pub mod scrape;
pub mod store;

pub use brands::BrandBook;
#[cfg(feature = "browser")]
pub use browser::BrowserSession;
pub use config::{builtin_sites, Config, Settings, SiteConfig};
pub use error::{ConfigError, SessionError, StoreError, TaxonomyError};
pub use extract::extract_price;
pub use models::{DailyStat, ScrapeTarget};
pub use pacing::Pacing;
pub use runner::{BatchRunner, RunSummary};
pub use scrape::{Orchestrator, PageSource};
pub use store::{SaveOutcome, StatsStore};
