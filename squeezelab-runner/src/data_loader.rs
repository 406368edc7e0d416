//! Bar loading and data resolution for the runner.
//!
//! Implements the fallback policy:
//! 1. If the CSV file exists → read it
//! 2. Otherwise, unless offline → fetch from the provider and save to the file
//! 3. Otherwise, if synthetic is enabled → generate synthetic bars (tagged)
//! 4. Otherwise → fail with a clear error
//!
//! Whatever the source, bars are canonicalized (insane bars dropped, sorted,
//! deduplicated) before they reach the engine.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use squeezelab_core::data::{
    canonicalize, generate_synthetic_bars, read_bars_csv, write_bars_csv, BarProvider, DataError,
    DataSource, SyntheticConfig,
};
use squeezelab_core::fingerprint::dataset_hash;
use squeezelab_core::Bar;

use crate::config::AnalysisConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file at {path} and network disabled (use --synthetic for synthetic data)")]
    NoDataOffline { path: PathBuf },

    #[error("no data file at {path} and fetching {symbol} failed: {reason}")]
    FetchFailed {
        path: PathBuf,
        symbol: String,
        reason: String,
    },

    #[error("no usable bars after validation ({dropped} dropped)")]
    NoUsableBars { dropped: usize },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub file: PathBuf,
    pub symbol: String,
    pub interval: String,
    pub limit: usize,
    /// If true, never make network requests.
    pub offline: bool,
    /// If true, generate synthetic bars when real data is unavailable.
    pub synthetic: bool,
    pub seed: u64,
}

impl LoadOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let data = &config.data;
        Self {
            file: data.file.clone(),
            symbol: data.symbol.clone(),
            interval: data.interval.clone(),
            limit: data.limit,
            offline: data.offline,
            synthetic: data.synthetic,
            seed: data.seed,
        }
    }
}

/// Bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over the canonical bars.
    pub dataset_hash: String,
    pub dropped_insane: usize,
    pub dropped_duplicates: usize,
}

impl LoadedData {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Load bars following the fallback policy above.
pub fn load_bars(
    provider: Option<&dyn BarProvider>,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    let (raw, source) = resolve(provider, opts)?;
    let raw_len = raw.len();
    let canonical = canonicalize(raw);

    if canonical.bars.is_empty() {
        return Err(LoadError::NoUsableBars {
            dropped: canonical.dropped_insane + canonical.dropped_duplicates,
        });
    }

    info!(
        source = ?source,
        raw = raw_len,
        bars = canonical.bars.len(),
        first = %canonical.bars[0].timestamp,
        last = %canonical.bars[canonical.bars.len() - 1].timestamp,
        "bars loaded"
    );

    Ok(LoadedData {
        dataset_hash: dataset_hash(&canonical.bars),
        bars: canonical.bars,
        source,
        dropped_insane: canonical.dropped_insane,
        dropped_duplicates: canonical.dropped_duplicates,
    })
}

fn resolve(
    provider: Option<&dyn BarProvider>,
    opts: &LoadOptions,
) -> Result<(Vec<Bar>, DataSource), LoadError> {
    // Step 1: local file
    if opts.file.exists() {
        let bars = read_bars_csv(&opts.file)?;
        return Ok((bars, DataSource::CsvFile));
    }
    warn!(path = %opts.file.display(), "data file not found");

    // Step 2: fetch and persist
    let mut fetch_error = None;
    if !opts.offline {
        if let Some(prov) = provider {
            match prov.fetch(&opts.symbol, &opts.interval, opts.limit) {
                Ok(bars) => {
                    write_bars_csv(&opts.file, &bars)?;
                    info!(
                        provider = prov.name(),
                        path = %opts.file.display(),
                        bars = bars.len(),
                        "fetched bars saved"
                    );
                    return Ok((bars, DataSource::Binance));
                }
                Err(e) => {
                    warn!(provider = prov.name(), error = %e, "fetch failed");
                    fetch_error = Some(e.to_string());
                }
            }
        }
    }

    // Step 3: synthetic fallback
    if opts.synthetic {
        warn!(
            seed = opts.seed,
            "generating synthetic bars; results will be tagged as synthetic"
        );
        let bars = generate_synthetic_bars(&SyntheticConfig {
            bars: opts.limit,
            seed: opts.seed,
            ..SyntheticConfig::default()
        });
        return Ok((bars, DataSource::Synthetic));
    }

    // Step 4: fail
    if opts.offline || provider.is_none() {
        return Err(LoadError::NoDataOffline {
            path: opts.file.clone(),
        });
    }
    Err(LoadError::FetchFailed {
        path: opts.file.clone(),
        symbol: opts.symbol.clone(),
        reason: fetch_error.unwrap_or_else(|| "unknown error".into()),
    })
}
