//! Analysis runner: wires together loading, the engine, and fingerprints.
//!
//! Two entry points:
//! - `run_analysis()`: loads bars per the config, then runs. Used by the CLI.
//! - `run_analysis_on_data()`: takes pre-loaded bars, no I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use squeezelab_core::data::{BarProvider, DataSource};
use squeezelab_core::fingerprint::output_hash;
use squeezelab_core::{
    analyze, AnnotatedBar, EngineError, OutcomeRecord, SqueezeRegion, SqueezeThresholds,
    SummaryRow,
};

use crate::config::{AnalysisConfig, ConfigError};
use crate::data_loader::{load_bars, LoadError, LoadOptions, LoadedData};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config: AnalysisConfig,
    pub config_hash: String,
    pub dataset_hash: String,
    pub output_hash: String,
    pub source: DataSource,
    pub has_synthetic: bool,
    pub bar_count: usize,
    pub first_timestamp: String,
    pub last_timestamp: String,
    pub dropped_bars: usize,
    pub squeeze_bar_count: usize,
    pub squeeze_event_count: usize,
    pub thresholds: SqueezeThresholds,
    pub regions: Vec<SqueezeRegion>,
    pub open_region: Option<SqueezeRegion>,
    pub outcomes: Vec<OutcomeRecord>,
    pub summary: Vec<SummaryRow>,
    /// The full indicator table. Exported as CSV on request, never embedded
    /// in the manifest.
    #[serde(skip)]
    pub bars: Vec<AnnotatedBar>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Validate the config, load bars, and run the engine.
pub fn run_analysis(
    config: &AnalysisConfig,
    provider: Option<&dyn BarProvider>,
) -> Result<AnalysisResult, RunError> {
    // Fail on bad parameters before touching the filesystem or network.
    config.validate()?;
    let loaded = load_bars(provider, &LoadOptions::from_config(config))?;
    run_analysis_on_data(config, &loaded)
}

/// Run the engine over already-loaded bars.
pub fn run_analysis_on_data(
    config: &AnalysisConfig,
    loaded: &LoadedData,
) -> Result<AnalysisResult, RunError> {
    config.validate()?;
    let params = config.to_analysis_params();
    let output = analyze(&loaded.bars, &params)?;

    let squeeze_bar_count = output.squeeze_bar_count();
    let squeeze_event_count = output.squeeze_event_count();
    if squeeze_bar_count == 0 {
        warn!("no squeeze bars found; try raising the quantile thresholds");
    }
    info!(
        squeeze_bars = squeeze_bar_count,
        squeeze_events = squeeze_event_count,
        regions = output.regions.len(),
        open_region = output.open_region.is_some(),
        outcomes = output.outcomes.len(),
        "analysis finished"
    );

    let stamp = |bar: Option<&AnnotatedBar>| {
        bar.map(|b| b.timestamp().to_rfc3339())
            .unwrap_or_default()
    };

    Ok(AnalysisResult {
        schema_version: SCHEMA_VERSION,
        config: config.clone(),
        config_hash: config.config_hash()?,
        dataset_hash: loaded.dataset_hash.clone(),
        output_hash: output_hash(&output.outcomes, &output.summary),
        source: loaded.source,
        has_synthetic: loaded.is_synthetic(),
        bar_count: output.bars.len(),
        first_timestamp: stamp(output.bars.first()),
        last_timestamp: stamp(output.bars.last()),
        dropped_bars: loaded.dropped_insane + loaded.dropped_duplicates,
        squeeze_bar_count,
        squeeze_event_count,
        thresholds: output.thresholds,
        regions: output.regions,
        open_region: output.open_region,
        outcomes: output.outcomes,
        summary: output.summary,
        bars: output.bars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use squeezelab_core::data::{generate_synthetic_bars, SyntheticConfig};
    use squeezelab_core::fingerprint::dataset_hash;

    fn loaded(n: usize) -> LoadedData {
        let bars = generate_synthetic_bars(&SyntheticConfig {
            bars: n,
            ..SyntheticConfig::default()
        });
        LoadedData {
            dataset_hash: dataset_hash(&bars),
            bars,
            source: DataSource::Synthetic,
            dropped_insane: 0,
            dropped_duplicates: 0,
        }
    }

    #[test]
    fn result_carries_counts_and_hashes() {
        let config = AnalysisConfig::default();
        let data = loaded(1500);
        let result = run_analysis_on_data(&config, &data).unwrap();

        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.bar_count, 1500);
        assert_eq!(result.bars.len(), 1500);
        assert!(result.has_synthetic);
        assert_eq!(result.dataset_hash, data.dataset_hash);
        assert_eq!(result.config_hash, config.config_hash().unwrap());
        assert!(result.squeeze_bar_count > 0);
        assert_eq!(
            result.summary.iter().map(|r| r.count).sum::<usize>(),
            result.outcomes.len()
        );
    }

    #[test]
    fn reruns_are_bit_identical() {
        let config = AnalysisConfig::default();
        let data = loaded(800);
        let a = run_analysis_on_data(&config, &data).unwrap();
        let b = run_analysis_on_data(&config, &data).unwrap();
        assert_eq!(a.output_hash, b.output_hash);
    }

    #[test]
    fn invalid_config_fails_before_loading() {
        let mut config = AnalysisConfig::default();
        config.breakout.hold_periods = vec![0];
        // The data file does not exist and offline is set: a load attempt
        // would yield a data error, not a config error.
        config.data.file = "/nonexistent/bars.csv".into();
        config.data.offline = true;

        let err = run_analysis(&config, None).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }
}
