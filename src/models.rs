//! Core data types: scrape targets and daily statistics rows.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Characters substituted with `_` when deriving storage filenames.
const UNSAFE_PATH_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Deterministically sanitize one path component of a storage filename.
///
/// Distinct raw names differing only in sanitized characters can collide
/// into one path; rows inside the file are still keyed by the raw
/// (site, keyword, date) triple, so colliding targets share a file without
/// corrupting each other's series.
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| if UNSAFE_PATH_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// One scraped time series: a (site, brand/keyword) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrapeTarget {
    pub site: String,
    pub keyword: String,
}

impl ScrapeTarget {
    pub fn new(site: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            keyword: keyword.into(),
        }
    }

    /// Storage filename for this target.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.csv",
            sanitize_component(&self.site),
            sanitize_component(&self.keyword)
        )
    }
}

impl fmt::Display for ScrapeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.site, self.keyword)
    }
}

/// One persisted row: daily statistics for a target.
///
/// Identity key is (site, keyword, date); the store never holds two rows
/// with the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub site: String,
    pub keyword: String,
    pub count: u32,
    #[serde(with = "two_decimal")]
    pub average_price: f64,
    pub min_price: u32,
    pub max_price: u32,
}

impl DailyStat {
    /// Compute a row from one day's price samples.
    ///
    /// Statistics are derived from the in-memory list only; historical rows
    /// are never re-aggregated. Returns `None` for an empty batch.
    pub fn from_prices(target: &ScrapeTarget, date: NaiveDate, prices: &[u32]) -> Option<Self> {
        let (&min_price, &max_price) = (prices.iter().min()?, prices.iter().max()?);
        let sum: u64 = prices.iter().map(|&p| u64::from(p)).sum();
        let mean = sum as f64 / prices.len() as f64;

        Some(Self {
            date,
            site: target.site.clone(),
            keyword: target.keyword.clone(),
            count: prices.len() as u32,
            average_price: (mean * 100.0).round() / 100.0,
            min_price,
            max_price,
        })
    }

    /// Identity key used for upsert and deduplication.
    pub fn key(&self) -> (NaiveDate, String, String) {
        (self.date, self.site.clone(), self.keyword.clone())
    }
}

/// Serialize `average_price` with exactly two decimal places, the format
/// the dashboard expects in the CSV files.
mod two_decimal {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:.2}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim().parse::<f64>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("mercari"), "mercari");
        assert_eq!(sanitize_component("A/B:C"), "A_B_C");
        assert_eq!(sanitize_component(r#"a\b*c?d"e<f>g|h"#), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn test_file_name_is_deterministic() {
        let target = ScrapeTarget::new("mercari", "FRAY I.D");
        assert_eq!(target.file_name(), "mercari_FRAY I.D.csv");
        assert_eq!(target.file_name(), ScrapeTarget::new("mercari", "FRAY I.D").file_name());
    }

    #[test]
    fn test_from_prices_statistics() {
        let target = ScrapeTarget::new("mercari", "Supreme");
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let stat = DailyStat::from_prices(&target, date, &[1000, 2000, 3000]).unwrap();

        assert_eq!(stat.count, 3);
        assert_eq!(stat.average_price, 2000.00);
        assert_eq!(stat.min_price, 1000);
        assert_eq!(stat.max_price, 3000);
    }

    #[test]
    fn test_from_prices_rounds_to_two_decimals() {
        let target = ScrapeTarget::new("mercari", "Supreme");
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let stat = DailyStat::from_prices(&target, date, &[1000, 1001, 1001]).unwrap();
        assert_eq!(stat.average_price, 1000.67);
    }

    #[test]
    fn test_from_prices_empty_is_none() {
        let target = ScrapeTarget::new("mercari", "Supreme");
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(DailyStat::from_prices(&target, date, &[]).is_none());
    }
}
