//! Squeeze detection: quantile thresholds and region segmentation.

pub mod quantile;
pub mod segmenter;

pub use segmenter::{
    identify_squeeze_periods, SqueezeAnalysis, SqueezeParams, SqueezeThresholds, ThresholdMode,
    DEFAULT_MIN_HISTORY,
};
