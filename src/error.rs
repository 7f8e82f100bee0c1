//! Error types for the scraping and storage pipeline.
//!
//! Everything below the batch-runner boundary is absorbed and converted
//! into "zero prices" or "skip" outcomes; these types exist so the absorb
//! points can log something more useful than a stringly-typed blob.

use std::path::PathBuf;

use thiserror::Error;

/// Failures owned by the browser session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The browser process or CDP connection could not be established.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Page load exceeded the configured bound.
    #[error("navigation timed out after {0}s")]
    NavigationTimeout(u64),

    /// Navigation failed outright (DNS, connection reset, bad URL).
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A script evaluation on the page failed.
    #[error("page evaluation failed: {0}")]
    Evaluate(String),

    /// The DOM snapshot could not be retrieved.
    #[error("page snapshot failed: {0}")]
    Snapshot(String),
}

/// Failures in the daily statistics store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The atomic rename of the rewritten time series failed.
    #[error("failed to replace {}: {source}", path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures loading the brand taxonomy file.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid brand file: {0}")]
    Parse(#[from] serde_json::Error),
}
