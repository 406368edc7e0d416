//! SqueezeLab Core: volatility squeeze detection and breakout measurement.
//!
//! The pipeline has four stages, each a pure function of its inputs:
//! - Indicator Calculator: Bollinger bands, bandwidth, and ATR per bar
//! - Squeeze Segmenter: quantile thresholds, squeeze flags, and regions
//! - Breakout Sampler: direction and forward returns after each region
//! - Results Aggregator: statistics grouped by hold period and direction
//!
//! [`analyze`] chains them. Data ingestion (CSV, Binance, synthetic) lives in
//! [`data`] and never feeds back into the stages.

pub mod breakout;
pub mod data;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod pipeline;
pub mod squeeze;
pub mod summary;

pub use breakout::{run_breakout_tests, DEFAULT_HOLD_PERIODS};
pub use domain::{AnnotatedBar, Bands, Bar, BreakoutDirection, OutcomeRecord, SqueezeRegion};
pub use error::EngineError;
pub use indicators::{compute_indicators, IndicatorParams};
pub use pipeline::{analyze, AnalysisOutput, AnalysisParams};
pub use squeeze::{
    identify_squeeze_periods, SqueezeAnalysis, SqueezeParams, SqueezeThresholds, ThresholdMode,
    DEFAULT_MIN_HISTORY,
};
pub use summary::{summarize_results, SummaryRow};
