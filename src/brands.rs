//! Brand taxonomy input: site → category → brand keywords.
//!
//! The taxonomy file is owned by the dashboard; the pipeline consumes it
//! read-only and only needs the flat (site, brand) iteration. A missing
//! file is seeded with a starter taxonomy so a fresh checkout produces
//! something scrapable.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::TaxonomyError;
use crate::models::ScrapeTarget;

/// The taxonomy: site name → category name → brand keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrandBook {
    pub sites: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl BrandBook {
    /// Load the taxonomy from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load the taxonomy, seeding a default file when none exists.
    ///
    /// Parse and write failures degrade to an in-memory default rather than
    /// aborting an unattended run.
    pub fn load_or_seed(path: &Path) -> Self {
        if !path.exists() {
            let book = Self::starter();
            match serde_json::to_string_pretty(&book) {
                Ok(json) => match fs::write(path, json) {
                    Ok(()) => info!(path = %path.display(), "seeded default brand file"),
                    Err(err) => warn!(%err, path = %path.display(), "could not write default brand file"),
                },
                Err(err) => warn!(%err, "could not serialize default brand file"),
            }
            return book;
        }

        match Self::load(path) {
            Ok(book) => book,
            Err(err) => {
                warn!(%err, path = %path.display(), "brand file unreadable; using defaults");
                Self::starter()
            }
        }
    }

    /// The starter taxonomy written on first run.
    pub fn starter() -> Self {
        let mut sites = BTreeMap::new();

        let mut mercari = BTreeMap::new();
        mercari.insert(
            "ストリート".to_string(),
            vec![
                "Supreme".to_string(),
                "Stussy".to_string(),
                "A BATHING APE".to_string(),
            ],
        );
        mercari.insert(
            "モード系".to_string(),
            vec![
                "Yohji Yamamoto".to_string(),
                "COMME des GARCONS".to_string(),
                "ISSEY MIYAKE".to_string(),
            ],
        );
        mercari.insert("未分類".to_string(), Vec::new());
        sites.insert("mercari".to_string(), mercari);

        let mut rakuma = BTreeMap::new();
        rakuma.insert(
            "レディースアパレル".to_string(),
            vec!["SNIDEL".to_string(), "FRAY I.D".to_string()],
        );
        rakuma.insert("未分類".to_string(), Vec::new());
        sites.insert("rakuma".to_string(), rakuma);

        Self { sites }
    }

    /// Flat iteration over every (site, brand) pair, in taxonomy order.
    pub fn targets(&self) -> impl Iterator<Item = ScrapeTarget> + '_ {
        self.sites.iter().flat_map(|(site, categories)| {
            categories.values().flatten().map(move |brand| ScrapeTarget::new(site, brand))
        })
    }

    /// Total number of brand entries.
    pub fn len(&self) -> usize {
        self.sites.values().flat_map(BTreeMap::values).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_flattens_categories() {
        let book = BrandBook::starter();
        let targets: Vec<ScrapeTarget> = book.targets().collect();

        assert!(targets.contains(&ScrapeTarget::new("mercari", "Supreme")));
        assert!(targets.contains(&ScrapeTarget::new("rakuma", "SNIDEL")));
        assert_eq!(targets.len(), book.len());
    }

    #[test]
    fn test_round_trips_through_json() {
        let book = BrandBook::starter();
        let json = serde_json::to_string(&book).unwrap();
        let back: BrandBook = serde_json::from_str(&json).unwrap();
        assert_eq!(back, book);
    }

    #[test]
    fn test_load_or_seed_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brands.json");

        let book = BrandBook::load_or_seed(&path);
        assert!(!book.is_empty());
        assert!(path.exists());

        // Second load reads the seeded file.
        let again = BrandBook::load(&path).unwrap();
        assert_eq!(again, book);
    }

    #[test]
    fn test_load_or_seed_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brands.json");
        fs::write(&path, "{ not json").unwrap();

        let book = BrandBook::load_or_seed(&path);
        assert_eq!(book, BrandBook::starter());
    }
}
