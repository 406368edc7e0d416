//! Breakout outcome records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How price left a squeeze.
///
/// Variant order is the order summary rows are sorted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakoutDirection {
    /// Breakout bar closed below the last squeeze bar's lower band.
    Down,
    /// Volatility expanded without a close outside the bands.
    Expansion,
    /// Breakout bar closed above the last squeeze bar's upper band.
    Up,
}

impl BreakoutDirection {
    /// Classify a breakout close against the reference bands.
    pub fn classify(close: f64, ref_upper: f64, ref_lower: f64) -> Self {
        if close > ref_upper {
            Self::Up
        } else if close < ref_lower {
            Self::Down
        } else {
            Self::Expansion
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Expansion => "expansion",
            Self::Up => "up",
        }
    }
}

impl fmt::Display for BreakoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price outcome of one squeeze region at one hold horizon.
///
/// Percentages are relative to the region's reference price and are `None`
/// when that price is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub squeeze_start_time: DateTime<Utc>,
    pub squeeze_end_time: DateTime<Utc>,
    pub breakout_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub breakout_index: usize,
    pub exit_index: usize,
    pub direction: BreakoutDirection,
    pub hold_period: usize,
    pub pct_change: Option<f64>,
    pub max_up_pct: Option<f64>,
    pub max_down_pct: Option<f64>,
    pub squeeze_duration: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_direction() {
        assert_eq!(BreakoutDirection::classify(110.0, 105.0, 95.0), BreakoutDirection::Up);
        assert_eq!(BreakoutDirection::classify(90.0, 105.0, 95.0), BreakoutDirection::Down);
        assert_eq!(
            BreakoutDirection::classify(100.0, 105.0, 95.0),
            BreakoutDirection::Expansion
        );
    }

    #[test]
    fn close_on_band_is_expansion() {
        assert_eq!(
            BreakoutDirection::classify(105.0, 105.0, 95.0),
            BreakoutDirection::Expansion
        );
        assert_eq!(
            BreakoutDirection::classify(95.0, 105.0, 95.0),
            BreakoutDirection::Expansion
        );
    }

    #[test]
    fn direction_serializes_lowercase() {
        let json = serde_json::to_string(&BreakoutDirection::Expansion).unwrap();
        assert_eq!(json, "\"expansion\"");
        assert_eq!(BreakoutDirection::Up.to_string(), "up");
    }

    #[test]
    fn directions_sort_alphabetically() {
        let mut dirs = vec![
            BreakoutDirection::Up,
            BreakoutDirection::Down,
            BreakoutDirection::Expansion,
        ];
        dirs.sort();
        assert_eq!(
            dirs,
            vec![
                BreakoutDirection::Down,
                BreakoutDirection::Expansion,
                BreakoutDirection::Up
            ]
        );
    }
}
