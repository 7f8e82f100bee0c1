//! Daily statistics store: one CSV time series per (site, keyword) target.
//!
//! Each save is a load-merge-write cycle: existing rows are read
//! tolerantly, the day's row is upserted by its (site, keyword, date)
//! identity key, the row set is deduplicated and sorted ascending by date,
//! and the whole file is rewritten through a temp file + atomic rename so
//! readers never observe a partial file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::models::{DailyStat, ScrapeTarget};

/// Outcome of a save call, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new row was appended for this date.
    Inserted,
    /// Today's existing row was overwritten.
    Updated,
    /// The price list was empty; nothing was touched.
    SkippedEmpty,
}

/// CSV-backed store for daily price statistics.
#[derive(Debug, Clone)]
pub struct StatsStore {
    data_dir: PathBuf,
}

impl StatsStore {
    /// Open the store, creating the data directory when missing.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Storage path for a target, derived from the sanitized components.
    pub fn path_for(&self, site: &str, keyword: &str) -> PathBuf {
        self.data_dir.join(ScrapeTarget::new(site, keyword).file_name())
    }

    /// Aggregate a day's prices and upsert them into the target's series,
    /// keyed by today's calendar date.
    pub fn save(&self, site: &str, keyword: &str, prices: &[u32]) -> Result<SaveOutcome, StoreError> {
        self.save_for_date(site, keyword, prices, Local::now().date_naive())
    }

    /// Like [`save`](Self::save) with an explicit calendar day (backfill,
    /// tests).
    pub fn save_for_date(
        &self,
        site: &str,
        keyword: &str,
        prices: &[u32],
        date: NaiveDate,
    ) -> Result<SaveOutcome, StoreError> {
        if prices.is_empty() {
            info!(site, keyword, "no prices to save");
            return Ok(SaveOutcome::SkippedEmpty);
        }

        let target = ScrapeTarget::new(site, keyword);
        let stat = DailyStat::from_prices(&target, date, prices)
            .expect("non-empty price list always aggregates");
        let path = self.path_for(site, keyword);

        let mut rows = read_rows_tolerant(&path);
        let outcome = upsert(&mut rows, stat);
        dedup_and_sort(&mut rows);
        write_rows(&path, &rows)?;

        match outcome {
            SaveOutcome::Updated => info!(site, keyword, %date, "updated today's statistics"),
            _ => info!(site, keyword, %date, rows = rows.len(), "saved daily statistics"),
        }
        Ok(outcome)
    }

    /// Stored rows for a target, ascending by date. Missing file → empty.
    pub fn load(&self, site: &str, keyword: &str) -> Vec<DailyStat> {
        read_rows_tolerant(&self.path_for(site, keyword))
    }
}

/// Upsert by identity key; overwrite statistics in place when the key
/// already exists.
fn upsert(rows: &mut Vec<DailyStat>, stat: DailyStat) -> SaveOutcome {
    match rows
        .iter_mut()
        .find(|row| row.date == stat.date && row.site == stat.site && row.keyword == stat.keyword)
    {
        Some(existing) => {
            existing.count = stat.count;
            existing.average_price = stat.average_price;
            existing.min_price = stat.min_price;
            existing.max_price = stat.max_price;
            SaveOutcome::Updated
        }
        None => {
            rows.push(stat);
            SaveOutcome::Inserted
        }
    }
}

/// Collapse duplicate identity keys (last writer wins) and order the rows
/// ascending by date.
fn dedup_and_sort(rows: &mut Vec<DailyStat>) {
    let mut merged: BTreeMap<(NaiveDate, String, String), DailyStat> = BTreeMap::new();
    for row in rows.drain(..) {
        merged.insert(row.key(), row);
    }
    rows.extend(merged.into_values());
}

/// Read existing rows, recovering from a missing, empty, or corrupt file by
/// starting over with zero rows. Malformed rows are dropped individually;
/// losing unreadable history is a known trade-off and is always warned
/// about, never silent.
fn read_rows_tolerant(path: &Path) -> Vec<DailyStat> {
    if !path.exists() {
        return Vec::new();
    }

    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(err) => {
            warn!(%err, path = %path.display(), "unreadable statistics file; starting fresh");
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for record in reader.deserialize::<DailyStat>() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) => warn!(%err, path = %path.display(), "dropping malformed row"),
        }
    }
    rows
}

/// Rewrite the whole series through a temp file in the same directory,
/// then atomically rename over the target.
fn write_rows(path: &Path, rows: &[DailyStat]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|err| StoreError::Replace {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}
