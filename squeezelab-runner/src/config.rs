//! Serializable analysis configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file (or no file)
//! is a valid configuration. CLI flags are applied on top afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use squeezelab_core::{
    AnalysisParams, EngineError, IndicatorParams, SqueezeParams, ThresholdMode,
    DEFAULT_HOLD_PERIODS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error("invalid config: {0}")]
    Invalid(#[from] EngineError),
}

/// Complete configuration for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data: DataSection,
    pub indicators: IndicatorParams,
    pub squeeze: SqueezeSection,
    pub breakout: BreakoutSection,
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// CSV file to read; fetched bars are written here when it is missing.
    pub file: PathBuf,
    pub symbol: String,
    pub interval: String,
    /// Number of klines to request when fetching.
    pub limit: usize,
    /// Never touch the network.
    pub offline: bool,
    /// Fall back to synthetic bars when no real data is available.
    pub synthetic: bool,
    pub seed: u64,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            file: PathBuf::from("data/BTCUSDT_1h.csv"),
            symbol: "BTCUSDT".into(),
            interval: "1h".into(),
            limit: 1000,
            offline: false,
            synthetic: false,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqueezeSection {
    pub bandwidth_quantile: f64,
    pub atr_quantile: f64,
    /// Use expanding (causal) thresholds instead of one global quantile.
    pub causal: bool,
    /// Defined values needed before an expanding threshold applies.
    pub min_history: usize,
}

impl Default for SqueezeSection {
    fn default() -> Self {
        let params = SqueezeParams::default();
        Self {
            bandwidth_quantile: params.bandwidth_quantile,
            atr_quantile: params.atr_quantile,
            causal: false,
            min_history: params.min_history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutSection {
    pub hold_periods: Vec<usize>,
}

impl Default for BreakoutSection {
    fn default() -> Self {
        Self {
            hold_periods: DEFAULT_HOLD_PERIODS.to_vec(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Engine parameters described by this config.
    pub fn to_analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            indicators: self.indicators.clone(),
            squeeze: SqueezeParams {
                bandwidth_quantile: self.squeeze.bandwidth_quantile,
                atr_quantile: self.squeeze.atr_quantile,
                threshold_mode: if self.squeeze.causal {
                    ThresholdMode::Expanding
                } else {
                    ThresholdMode::Global
                },
                min_history: self.squeeze.min_history,
            },
            hold_periods: self.breakout.hold_periods.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_analysis_params().validate()?;
        Ok(())
    }

    /// BLAKE3 over the canonical JSON of the engine parameters.
    ///
    /// The data section is excluded: the same parameters on different data
    /// share a config hash and differ by dataset hash.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(&self.to_analysis_params())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = AnalysisConfig::from_toml("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.breakout.hold_periods, vec![1, 4, 12, 24, 168]);
        assert_eq!(config.data.symbol, "BTCUSDT");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AnalysisConfig::from_toml(
            r#"
            [indicators]
            bb_window = 30

            [squeeze]
            causal = true
            min_history = 50

            [breakout]
            hold_periods = [2, 6]
            "#,
        )
        .unwrap();

        assert_eq!(config.indicators.bb_window, 30);
        assert_eq!(config.indicators.atr_window, 14);
        assert_eq!(config.squeeze.bandwidth_quantile, 0.10);

        let params = config.to_analysis_params();
        assert_eq!(params.squeeze.threshold_mode, ThresholdMode::Expanding);
        assert_eq!(params.squeeze.min_history, 50);
        assert_eq!(params.hold_periods, vec![2, 6]);
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = AnalysisConfig::default();
        config.squeeze.causal = true;
        config.data.limit = 500;
        let text = config.to_toml().unwrap();
        assert_eq!(AnalysisConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = AnalysisConfig::from_toml("[indicators\nbb_window = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.squeeze.atr_quantile = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(EngineError::InvalidQuantile { .. }))
        ));

        let mut config = AnalysisConfig::default();
        config.indicators.bb_window = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.squeeze.min_history = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(EngineError::InvalidWindow { .. }))
        ));

        let mut config = AnalysisConfig::default();
        config.breakout.hold_periods = vec![4, 0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(EngineError::InvalidHorizon(0)))
        ));
    }

    #[test]
    fn config_hash_tracks_engine_params_only() {
        let base = AnalysisConfig::default();
        let h1 = base.config_hash().unwrap();
        assert_eq!(h1, base.config_hash().unwrap());
        assert_eq!(h1.len(), 64);

        let mut other_data = base.clone();
        other_data.data.symbol = "ETHUSDT".into();
        assert_eq!(h1, other_data.config_hash().unwrap());

        let mut other_params = base.clone();
        other_params.squeeze.causal = true;
        assert_ne!(h1, other_params.config_hash().unwrap());
    }
}
