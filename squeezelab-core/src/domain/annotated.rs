//! Bars annotated with volatility indicators and squeeze classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Bar;

/// Bollinger band values for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub mid: f64,
    pub upper: f64,
    pub lower: f64,
    /// Population standard deviation of the close window.
    pub std_dev: f64,
}

impl Bands {
    /// Distance between the upper and lower band.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Band width normalized by the middle band.
    ///
    /// `None` when the middle band is zero, so a collapsed price never reads
    /// as an infinitely wide band.
    pub fn bandwidth(&self) -> Option<f64> {
        if self.mid == 0.0 {
            return None;
        }
        let bw = self.width() / self.mid;
        bw.is_finite().then_some(bw)
    }
}

/// A bar plus its derived indicator and squeeze fields.
///
/// Every derived value is an explicit `Option`: warm-up bars carry `None`
/// rather than a NaN that could leak into comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    pub bar: Bar,
    pub bands: Option<Bands>,
    pub bandwidth: Option<f64>,
    pub atr: Option<f64>,
    /// `None` wherever `bandwidth` or `atr` is undefined.
    pub is_squeeze: Option<bool>,
    /// Set on the first bar of a squeeze run.
    pub squeeze_start: bool,
    /// Set on the first bar after a squeeze run.
    pub squeeze_end: bool,
}

impl AnnotatedBar {
    /// Wrap a bar with no derived values yet.
    pub fn new(bar: Bar) -> Self {
        Self {
            bar,
            bands: None,
            bandwidth: None,
            atr: None,
            is_squeeze: None,
            squeeze_start: false,
            squeeze_end: false,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.bar.timestamp
    }

    /// True only for bars classified as squeeze. Unclassified bars are not.
    pub fn in_squeeze(&self) -> bool {
        self.is_squeeze == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandwidth_is_width_over_mid() {
        let bands = Bands {
            mid: 100.0,
            upper: 104.0,
            lower: 96.0,
            std_dev: 2.0,
        };
        assert_eq!(bands.width(), 8.0);
        assert_eq!(bands.bandwidth(), Some(0.08));
    }

    #[test]
    fn bandwidth_undefined_for_zero_mid() {
        let bands = Bands {
            mid: 0.0,
            upper: 0.0,
            lower: 0.0,
            std_dev: 0.0,
        };
        assert_eq!(bands.bandwidth(), None);
    }

    #[test]
    fn unclassified_bar_is_not_in_squeeze() {
        let bar = Bar {
            timestamp: chrono::DateTime::from_timestamp(0, 0).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        };
        let mut annotated = AnnotatedBar::new(bar);
        assert!(!annotated.in_squeeze());
        annotated.is_squeeze = Some(false);
        assert!(!annotated.in_squeeze());
        annotated.is_squeeze = Some(true);
        assert!(annotated.in_squeeze());
    }
}
