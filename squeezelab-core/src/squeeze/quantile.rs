//! Quantiles with linear interpolation between closest ranks.
//!
//! For sorted values `s` of length `n`, `pos = q * (n - 1)` and the result is
//! `s[floor(pos)] + (s[ceil(pos)] - s[floor(pos)]) * frac(pos)`.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Quantile of already-sorted values. `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Quantile of the defined values in `values`.
pub fn quantile<I>(values: I, q: f64) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sorted: Vec<f64> = values.into_iter().flatten().collect();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// Quantile over a growing prefix of a series.
///
/// Two heaps split the values at rank `floor(q * (n - 1))`: `lower` holds that
/// rank and everything below it, `upper` the rest. The two ranks needed for
/// interpolation are the heap tops, so each push costs `O(log n)`.
#[derive(Debug, Clone)]
pub struct ExpandingQuantile {
    q: f64,
    min_history: usize,
    lower: BinaryHeap<Ordered>,
    upper: BinaryHeap<Reverse<Ordered>>,
}

/// `f64` ordered by `total_cmp`.
#[derive(Debug, Clone, Copy)]
struct Ordered(f64);

impl PartialEq for Ordered {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for Ordered {}

impl PartialOrd for Ordered {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ordered {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl ExpandingQuantile {
    pub fn new(q: f64) -> Self {
        Self::with_min_history(q, 1)
    }

    /// The quantile stays undefined until `min_history` values have been pushed.
    pub fn with_min_history(q: f64, min_history: usize) -> Self {
        Self {
            q: q.clamp(0.0, 1.0),
            min_history: min_history.max(1),
            lower: BinaryHeap::new(),
            upper: BinaryHeap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len() + self.upper.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn position(&self) -> f64 {
        self.q * (self.len() - 1) as f64
    }

    pub fn push(&mut self, value: f64) {
        let value = Ordered(value);
        match self.lower.peek() {
            Some(top) if value <= *top => self.lower.push(value),
            _ => self.upper.push(Reverse(value)),
        }

        let target = self.position().floor() as usize + 1;
        while self.lower.len() > target {
            if let Some(v) = self.lower.pop() {
                self.upper.push(Reverse(v));
            }
        }
        while self.lower.len() < target {
            match self.upper.pop() {
                Some(Reverse(v)) => self.lower.push(v),
                None => break,
            }
        }
    }

    /// Quantile of every value pushed so far.
    pub fn current(&self) -> Option<f64> {
        if self.len() < self.min_history {
            return None;
        }
        let lo_value = self.lower.peek()?.0;
        let pos = self.position();
        let frac = pos - pos.floor();
        if pos.ceil() == pos.floor() {
            return Some(lo_value);
        }
        let hi_value = self.upper.peek().map_or(lo_value, |Reverse(v)| v.0);
        Some(lo_value + (hi_value - lo_value) * frac)
    }

    /// Thresholds for each prefix `0..=i` of `values`; undefined entries are
    /// skipped but still get the running threshold.
    pub fn series(values: &[Option<f64>], q: f64) -> Vec<Option<f64>> {
        Self::series_with_min_history(values, q, 1)
    }

    /// Like [`ExpandingQuantile::series`], but entries stay `None` until
    /// `min_history` defined values have been seen.
    pub fn series_with_min_history(
        values: &[Option<f64>],
        q: f64,
        min_history: usize,
    ) -> Vec<Option<f64>> {
        let mut acc = Self::with_min_history(q, min_history);
        values
            .iter()
            .map(|v| {
                if let Some(v) = v {
                    acc.push(*v);
                }
                acc.current()
            })
            .collect()
    }
}
