//! Bar provider trait and structured error types.
//!
//! The BarProvider trait abstracts over remote OHLCV sources so the loader
//! can swap implementations and tests can mock the network.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: cannot parse {column} value '{value}'")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("endpoint {0} is restricted in this region (HTTP 451)")]
    RegionRestricted(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("no bars returned for {symbol}")]
    Empty { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Where a bar sequence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    CsvFile,
    Binance,
    Synthetic,
}

/// A remote source of OHLCV bars.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the most recent `limit` bars for `symbol` at `interval`
    /// (e.g. "1h", "4h", "1d"), oldest first.
    fn fetch(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Bar>, DataError>;
}
