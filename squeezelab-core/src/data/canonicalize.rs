//! Canonical bar order: drop insane rows, sort by time, keep the first bar
//! for each timestamp.

use tracing::warn;

use crate::domain::Bar;

/// Bars in engine-ready order plus what was removed to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Canonicalized {
    pub bars: Vec<Bar>,
    pub dropped_insane: usize,
    pub dropped_duplicates: usize,
}

pub fn canonicalize(mut bars: Vec<Bar>) -> Canonicalized {
    let before = bars.len();
    bars.retain(Bar::is_sane);
    let dropped_insane = before - bars.len();

    // Stable sort, so among equal timestamps the earliest row stays first.
    bars.sort_by_key(|b| b.timestamp);
    let sorted = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    let dropped_duplicates = sorted - bars.len();

    if dropped_insane > 0 || dropped_duplicates > 0 {
        warn!(dropped_insane, dropped_duplicates, "bars removed during canonicalization");
    }

    Canonicalized {
        bars,
        dropped_insane,
        dropped_duplicates,
    }
}
