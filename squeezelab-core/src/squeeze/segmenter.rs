//! Squeeze Segmenter.
//!
//! A bar is a squeeze bar when both its bandwidth and its ATR sit at or below
//! their low-quantile thresholds. Consecutive squeeze bars form a region.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::quantile::{quantile, ExpandingQuantile};
use crate::domain::{AnnotatedBar, SqueezeRegion};
use crate::error::{check_quantile, check_window, EngineError};

/// How squeeze thresholds are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// One quantile over the whole sequence. Later bars influence the
    /// classification of earlier ones (look-ahead bias).
    #[default]
    Global,
    /// Quantile over bars `0..=i` only, so bar `i` never sees the future.
    /// Thresholds stay undefined, and bars unflagged, until
    /// [`SqueezeParams::min_history`] defined values have been seen; without
    /// that warm-up the first measured bar is always at its own quantile.
    Expanding,
}

/// Parameters for the Squeeze Segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqueezeParams {
    pub bandwidth_quantile: f64,
    pub atr_quantile: f64,
    pub threshold_mode: ThresholdMode,
    /// Defined values required before an expanding threshold exists.
    /// Ignored in global mode.
    pub min_history: usize,
}

pub const DEFAULT_MIN_HISTORY: usize = 20;

impl Default for SqueezeParams {
    fn default() -> Self {
        Self {
            bandwidth_quantile: 0.10,
            atr_quantile: 0.10,
            threshold_mode: ThresholdMode::Global,
            min_history: DEFAULT_MIN_HISTORY,
        }
    }
}

impl SqueezeParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        check_quantile("bandwidth_quantile", self.bandwidth_quantile)?;
        check_quantile("atr_quantile", self.atr_quantile)?;
        check_window("min_history", self.min_history)
    }
}

/// Thresholds used for classification. In expanding mode these are the
/// values in effect at the final bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SqueezeThresholds {
    pub bandwidth: Option<f64>,
    pub atr: Option<f64>,
}

/// Classified bars plus the squeeze regions found in them.
#[derive(Debug, Clone, PartialEq)]
pub struct SqueezeAnalysis {
    pub bars: Vec<AnnotatedBar>,
    /// Closed regions in chronological order; each has a breakout bar.
    pub regions: Vec<SqueezeRegion>,
    /// A squeeze still running at the last bar. Not sampled.
    pub open_region: Option<SqueezeRegion>,
    pub thresholds: SqueezeThresholds,
}

impl SqueezeAnalysis {
    pub fn squeeze_bar_count(&self) -> usize {
        self.bars.iter().filter(|b| b.in_squeeze()).count()
    }

    /// Number of squeeze-to-normal transitions.
    pub fn squeeze_event_count(&self) -> usize {
        self.bars.iter().filter(|b| b.squeeze_end).count()
    }
}

/// Classify every bar and extract squeeze regions.
///
/// Returns a new bar vector; the input slice is left untouched.
pub fn identify_squeeze_periods(
    bars: &[AnnotatedBar],
    params: &SqueezeParams,
) -> Result<SqueezeAnalysis, EngineError> {
    params.validate()?;
    if bars.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    let bandwidths: Vec<Option<f64>> = bars.iter().map(|b| b.bandwidth).collect();
    let atrs: Vec<Option<f64>> = bars.iter().map(|b| b.atr).collect();

    let (bw_thresholds, atr_thresholds) = match params.threshold_mode {
        ThresholdMode::Global => {
            let bw = quantile(bandwidths.iter().copied(), params.bandwidth_quantile);
            let atr = quantile(atrs.iter().copied(), params.atr_quantile);
            (vec![bw; bars.len()], vec![atr; bars.len()])
        }
        ThresholdMode::Expanding => (
            ExpandingQuantile::series_with_min_history(
                &bandwidths,
                params.bandwidth_quantile,
                params.min_history,
            ),
            ExpandingQuantile::series_with_min_history(
                &atrs,
                params.atr_quantile,
                params.min_history,
            ),
        ),
    };

    let thresholds = SqueezeThresholds {
        bandwidth: bw_thresholds.last().copied().flatten(),
        atr: atr_thresholds.last().copied().flatten(),
    };
    debug!(
        mode = ?params.threshold_mode,
        bandwidth = ?thresholds.bandwidth,
        atr = ?thresholds.atr,
        "squeeze thresholds"
    );

    let mut classified = bars.to_vec();
    let mut prev = false;
    for (i, bar) in classified.iter_mut().enumerate() {
        bar.is_squeeze = classify(bar, bw_thresholds[i], atr_thresholds[i]);
        let current = bar.in_squeeze();
        bar.squeeze_start = current && !prev;
        bar.squeeze_end = prev && !current;
        prev = current;
    }

    let (regions, open_region) = collect_regions(&classified);

    let analysis = SqueezeAnalysis {
        bars: classified,
        regions,
        open_region,
        thresholds,
    };
    info!(
        squeeze_bars = analysis.squeeze_bar_count(),
        regions = analysis.regions.len(),
        open = analysis.open_region.is_some(),
        "squeeze periods identified"
    );
    Ok(analysis)
}

fn classify(
    bar: &AnnotatedBar,
    bw_threshold: Option<f64>,
    atr_threshold: Option<f64>,
) -> Option<bool> {
    let bandwidth = bar.bandwidth?;
    let atr = bar.atr?;
    let squeezed = match (bw_threshold, atr_threshold) {
        (Some(bt), Some(at)) => bandwidth <= bt && atr <= at,
        _ => false,
    };
    Some(squeezed)
}

/// Split classified bars into maximal squeeze runs. A run touching the last
/// bar is returned separately as the open region.
fn collect_regions(bars: &[AnnotatedBar]) -> (Vec<SqueezeRegion>, Option<SqueezeRegion>) {
    let mut regions = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, bar) in bars.iter().enumerate() {
        if bar.in_squeeze() {
            run_start.get_or_insert(i);
        } else if let Some(start) = run_start.take() {
            regions.extend(SqueezeRegion::from_run(bars, start, i - 1));
        }
    }

    let open_region =
        run_start.and_then(|start| SqueezeRegion::from_run(bars, start, bars.len() - 1));
    (regions, open_region)
}
