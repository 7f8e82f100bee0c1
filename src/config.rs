//! Configuration: per-site scraping parameters and runtime settings.
//!
//! Built-in site configurations cover the supported marketplaces; a TOML
//! file can override them or add new sites. Everything is resolved into
//! immutable values at startup and passed by reference into the pipeline;
//! no global mutable state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Default config filename probed in the working directory.
const DEFAULT_CONFIG_FILE: &str = "nefuda.toml";

fn default_max_items() -> usize {
    20
}

fn default_wait_after_load() -> (f64, f64) {
    (2.0, 4.0)
}

fn default_scroll_count() -> (u32, u32) {
    (1, 3)
}

fn default_scroll_height() -> (u32, u32) {
    (300, 700)
}

fn default_scroll_wait() -> (f64, f64) {
    (0.5, 1.5)
}

fn default_listing_wait() -> u64 {
    15
}

/// Scraping parameters for one marketplace.
///
/// Selector lists are ordered by preference and re-resolved on every
/// scrape, so entries can be added or removed without any data migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Search URL with a `{keyword}` placeholder.
    pub url_template: String,
    /// Candidate item-container selectors; first non-empty match wins.
    pub item_container_selectors: Vec<String>,
    /// Candidate price sub-element selectors, tried per item in order.
    pub price_inner_selectors: Vec<String>,
    #[serde(default = "default_max_items")]
    pub max_items_to_scrape: usize,
    /// Post-load settle pause, seconds `[min, max]`.
    #[serde(default = "default_wait_after_load")]
    pub wait_time_after_load: (f64, f64),
    /// Scroll pass budget `[min, max]`; the upper bound caps passes.
    #[serde(default = "default_scroll_count")]
    pub scroll_count: (u32, u32),
    /// Per-scroll pixel distance `[min, max]`.
    #[serde(default = "default_scroll_height")]
    pub scroll_height: (u32, u32),
    /// Pause between scrolls, seconds `[min, max]`.
    #[serde(default = "default_scroll_wait")]
    pub scroll_wait_time: (f64, f64),
    /// Upper bound on waiting for the first listings to render, seconds.
    #[serde(default = "default_listing_wait")]
    pub listing_wait_secs: u64,
}

impl SiteConfig {
    /// Build the search URL for a keyword.
    pub fn search_url(&self, keyword: &str) -> String {
        self.url_template.replace("{keyword}", keyword)
    }
}

/// The compiled-in marketplace configurations.
pub fn builtin_sites() -> BTreeMap<String, SiteConfig> {
    let mut sites = BTreeMap::new();

    sites.insert(
        "mercari".to_string(),
        SiteConfig {
            url_template:
                "https://jp.mercari.com/search?keyword={keyword}&status=on_sale&order=desc&sort=created_time"
                    .to_string(),
            item_container_selectors: vec![
                r#"li[data-testid="item-cell"]"#.to_string(),
                r#"div[data-testid="item-cell"]"#.to_string(),
                "mer-item-thumbnail".to_string(),
                ".merListItem".to_string(),
            ],
            price_inner_selectors: vec![
                r#"[data-testid="price"]"#.to_string(),
                r#"[class*="Price"]"#.to_string(),
                ".merPrice".to_string(),
                r#"span[class*="price"]"#.to_string(),
            ],
            max_items_to_scrape: 30,
            wait_time_after_load: (3.0, 5.0),
            scroll_count: (2, 4),
            scroll_height: (400, 800),
            scroll_wait_time: (0.8, 1.8),
            listing_wait_secs: default_listing_wait(),
        },
    );

    sites.insert(
        "rakuma".to_string(),
        SiteConfig {
            url_template: "https://fril.jp/s?query={keyword}&sort=created_at&order=desc".to_string(),
            item_container_selectors: vec![".item-box".to_string()],
            price_inner_selectors: vec![".price".to_string(), ".item-price__value".to_string()],
            max_items_to_scrape: 25,
            wait_time_after_load: (2.0, 4.0),
            scroll_count: (2, 3),
            scroll_height: (500, 700),
            scroll_wait_time: (1.0, 2.0),
            listing_wait_secs: default_listing_wait(),
        },
    );

    sites
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the CSV time series.
    pub data_dir: PathBuf,
    /// Brand taxonomy file (site → category → brands).
    pub brand_file: PathBuf,
    /// User agent presented by the browser session.
    pub user_agent: String,
    /// Page-load timeout in seconds.
    pub page_load_timeout: u64,
    /// Pause between brands within a site, seconds `[min, max]`.
    pub brand_pause: (f64, f64),
    /// Pause between sites, seconds `[min, max]`.
    pub site_pause: (f64, f64),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            brand_file: PathBuf::from("brands.json"),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36"
                .to_string(),
            page_load_timeout: 30,
            brand_pause: (4.0, 9.0),
            site_pause: (15.0, 30.0),
        }
    }
}

/// Configuration file structure (TOML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_load_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_pause: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_pause: Option<(f64, f64)>,
    /// Site configurations; merged over the built-in ones by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sites: BTreeMap<String, SiteConfig>,
}

impl Config {
    /// Load configuration from an explicit path, or probe `nefuda.toml` in
    /// the working directory. A missing default file yields the built-in
    /// configuration; a missing explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if required {
                return Err(ConfigError::Read {
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                    path,
                });
            }
            debug!(path = %path.display(), "no config file; using built-in defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;
        Ok(config)
    }

    /// Resolve into runtime settings plus the effective site table
    /// (built-ins overlaid with file entries).
    pub fn into_runtime(self) -> (Settings, BTreeMap<String, SiteConfig>) {
        let defaults = Settings::default();
        let settings = Settings {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            brand_file: self.brand_file.unwrap_or(defaults.brand_file),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            page_load_timeout: self.page_load_timeout.unwrap_or(defaults.page_load_timeout),
            brand_pause: self.brand_pause.unwrap_or(defaults.brand_pause),
            site_pause: self.site_pause.unwrap_or(defaults.site_pause),
        };

        let mut sites = builtin_sites();
        sites.extend(self.sites);
        (settings, sites)
    }
}
