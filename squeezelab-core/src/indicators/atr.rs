//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the simple mean of the trailing `period` true-range values.
//! Lookback: period - 1 (TR[0] falls back to high-low, so it counts).

use crate::domain::Bar;
use crate::error::{check_window, EngineError};

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, EngineError> {
        check_window("atr_window", period)?;
        Ok(Self { period })
    }

    /// Number of leading bars without an ATR value.
    pub fn lookback(&self) -> usize {
        self.period - 1
    }

    pub fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        rolling_mean(&true_range(bars), self.period)
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];

    if n == 0 {
        return tr;
    }

    // First bar: just high - low
    let h = bars[0].high;
    let l = bars[0].low;
    if h.is_finite() && l.is_finite() {
        tr[0] = h - l;
    }

    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        // f64::max skips NaN, so a missing input has to be caught up front
        if h.is_finite() && l.is_finite() && pc.is_finite() {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }

    tr
}

/// Trailing arithmetic mean over `period` values. Windows that are short or
/// contain a non-finite value yield `None`.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| !v.is_finite()) {
            continue;
        }
        result[i] = Some(window.iter().sum::<f64>() / period as f64);
    }

    result
}
