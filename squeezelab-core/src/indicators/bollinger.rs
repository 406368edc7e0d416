//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use crate::domain::{Bands, Bar};
use crate::error::{check_window, EngineError};

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64) -> Result<Self, EngineError> {
        check_window("bb_window", period)?;
        if !(multiplier > 0.0 && multiplier.is_finite()) {
            return Err(EngineError::InvalidMultiplier(multiplier));
        }
        Ok(Self { period, multiplier })
    }

    /// Number of leading bars without bands.
    pub fn lookback(&self) -> usize {
        self.period - 1
    }

    /// Compute the bands for every bar. Warm-up bars and windows containing a
    /// non-finite close are `None`.
    pub fn compute(&self, bars: &[Bar]) -> Vec<Option<Bands>> {
        let n = bars.len();
        let mut result = vec![None; n];

        if n < self.period {
            return result;
        }

        for i in self.lookback()..n {
            let window = &bars[i + 1 - self.period..=i];

            if window.iter().any(|bar| !bar.close.is_finite()) {
                continue;
            }

            let sum: f64 = window.iter().map(|bar| bar.close).sum();
            let mean = sum / self.period as f64;

            let variance: f64 = window
                .iter()
                .map(|bar| {
                    let diff = bar.close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / self.period as f64;
            let std_dev = variance.sqrt();

            result[i] = Some(Bands {
                mid: mean,
                upper: mean + self.multiplier * std_dev,
                lower: mean - self.multiplier * std_dev,
                std_dev,
            });
        }

        result
    }
}
