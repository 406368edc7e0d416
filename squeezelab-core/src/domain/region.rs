//! Squeeze regions: maximal runs of consecutive squeeze bars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AnnotatedBar;

/// A maximal contiguous run of squeeze bars.
///
/// Reference values come from the last bar of the run: that bar's close is
/// the price every outcome is measured against, and its bands decide the
/// breakout direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqueezeRegion {
    /// Index of the first squeeze bar.
    pub start_index: usize,
    /// Index of the last squeeze bar (inclusive).
    pub end_index: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Number of bars in the run.
    pub duration: usize,
    pub ref_price: f64,
    pub ref_upper: f64,
    pub ref_lower: f64,
}

impl SqueezeRegion {
    /// Build a region from the inclusive run `start..=end` of `bars`.
    ///
    /// Returns `None` if the run is out of bounds or its last bar has no
    /// bands, which cannot happen for a run of classified squeeze bars.
    pub fn from_run(bars: &[AnnotatedBar], start: usize, end: usize) -> Option<Self> {
        if start > end {
            return None;
        }
        let first = bars.get(start)?;
        let last = bars.get(end)?;
        let bands = last.bands?;
        Some(Self {
            start_index: start,
            end_index: end,
            start_time: first.timestamp(),
            end_time: last.timestamp(),
            duration: end - start + 1,
            ref_price: last.bar.close,
            ref_upper: bands.upper,
            ref_lower: bands.lower,
        })
    }

    /// Index of the bar right after the region, the breakout bar.
    pub fn breakout_index(&self) -> usize {
        self.end_index + 1
    }

    /// True when the region runs to the last bar of a sequence of `len` bars,
    /// leaving no breakout bar to measure.
    pub fn is_open(&self, len: usize) -> bool {
        self.breakout_index() >= len
    }
}
