//! Indicator Calculator: Bollinger bands, bandwidth, and ATR per bar.
//!
//! Indicators are pure functions of the bar history: the value at bar `i`
//! only looks at bars `0..=i`. They are computed once for the whole sequence
//! and stored on [`AnnotatedBar`]s.

pub mod atr;
pub mod bollinger;

pub use atr::{true_range, Atr};
pub use bollinger::Bollinger;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{AnnotatedBar, Bar};
use crate::error::EngineError;

/// Window parameters for the Indicator Calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    /// Bollinger window in bars.
    pub bb_window: usize,
    /// Standard deviation multiplier for the outer bands.
    pub bb_std_multiplier: f64,
    /// ATR window in bars.
    pub atr_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            bb_window: 20,
            bb_std_multiplier: 2.0,
            atr_window: 14,
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        Bollinger::new(self.bb_window, self.bb_std_multiplier)?;
        Atr::new(self.atr_window)?;
        Ok(())
    }
}

/// Compute bands, bandwidth, and ATR for every bar.
///
/// The output has the same length and order as `bars`. Squeeze fields are
/// left unclassified; see [`identify_squeeze_periods`].
///
/// [`identify_squeeze_periods`]: crate::squeeze::identify_squeeze_periods
pub fn compute_indicators(
    bars: &[Bar],
    params: &IndicatorParams,
) -> Result<Vec<AnnotatedBar>, EngineError> {
    let bollinger = Bollinger::new(params.bb_window, params.bb_std_multiplier)?;
    let atr = Atr::new(params.atr_window)?;

    if bars.is_empty() {
        return Err(EngineError::EmptyInput);
    }
    check_ordering(bars)?;

    let bands = bollinger.compute(bars);
    let atr_values = atr.compute(bars);

    let annotated: Vec<AnnotatedBar> = bars
        .iter()
        .zip(bands)
        .zip(atr_values)
        .map(|((bar, bands), atr)| AnnotatedBar {
            bandwidth: bands.and_then(|b| b.bandwidth()),
            bands,
            atr,
            ..AnnotatedBar::new(bar.clone())
        })
        .collect();

    debug!(
        bars = annotated.len(),
        bb_window = params.bb_window,
        atr_window = params.atr_window,
        "indicators computed"
    );

    Ok(annotated)
}

/// Reject sequences whose timestamps are not strictly increasing.
pub fn check_ordering(bars: &[Bar]) -> Result<(), EngineError> {
    match bars
        .windows(2)
        .position(|pair| pair[1].timestamp <= pair[0].timestamp)
    {
        Some(pos) => Err(EngineError::UnorderedTimestamps { index: pos + 1 }),
        None => Ok(()),
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::DateTime::from_timestamp(1_704_067_200, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Create hourly bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base = chrono::DateTime::from_timestamp(1_704_067_200, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + chrono::Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
