//! Full engine pass: indicators → squeeze segmentation → breakout sampling →
//! summary.
//!
//! Each call is independent and keeps no state between invocations, so the
//! same function serves one-shot analysis and expanding-prefix backtests.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::breakout::{run_breakout_tests, DEFAULT_HOLD_PERIODS};
use crate::domain::{AnnotatedBar, Bar, OutcomeRecord, SqueezeRegion};
use crate::error::EngineError;
use crate::indicators::{compute_indicators, IndicatorParams};
use crate::squeeze::{identify_squeeze_periods, SqueezeParams, SqueezeThresholds};
use crate::summary::{summarize_results, SummaryRow};

/// Every engine parameter in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    pub indicators: IndicatorParams,
    pub squeeze: SqueezeParams,
    pub hold_periods: Vec<usize>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            squeeze: SqueezeParams::default(),
            hold_periods: DEFAULT_HOLD_PERIODS.to_vec(),
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.indicators.validate()?;
        self.squeeze.validate()?;
        if let Some(&bad) = self.hold_periods.iter().find(|&&h| h == 0) {
            return Err(EngineError::InvalidHorizon(bad));
        }
        Ok(())
    }
}

/// Everything one engine pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub bars: Vec<AnnotatedBar>,
    pub regions: Vec<SqueezeRegion>,
    pub open_region: Option<SqueezeRegion>,
    pub thresholds: SqueezeThresholds,
    pub outcomes: Vec<OutcomeRecord>,
    pub summary: Vec<SummaryRow>,
}

impl AnalysisOutput {
    pub fn squeeze_bar_count(&self) -> usize {
        self.bars.iter().filter(|b| b.in_squeeze()).count()
    }

    pub fn squeeze_event_count(&self) -> usize {
        self.bars.iter().filter(|b| b.squeeze_end).count()
    }
}

/// Run all four stages over `bars`.
///
/// Parameters are validated before any work is done, so a failure never
/// leaves partial output behind.
pub fn analyze(bars: &[Bar], params: &AnalysisParams) -> Result<AnalysisOutput, EngineError> {
    params.validate()?;

    let annotated = compute_indicators(bars, &params.indicators)?;
    let squeeze = identify_squeeze_periods(&annotated, &params.squeeze)?;
    let outcomes = run_breakout_tests(&squeeze.bars, &squeeze.regions, &params.hold_periods)?;
    let summary = summarize_results(&outcomes);

    info!(
        bars = squeeze.bars.len(),
        squeeze_events = squeeze.squeeze_event_count(),
        outcomes = outcomes.len(),
        summary_rows = summary.len(),
        "analysis complete"
    );

    Ok(AnalysisOutput {
        bars: squeeze.bars,
        regions: squeeze.regions,
        open_region: squeeze.open_region,
        thresholds: squeeze.thresholds,
        outcomes,
        summary,
    })
}
