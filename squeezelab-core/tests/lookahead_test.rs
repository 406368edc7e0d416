//! Look-ahead contamination tests.
//!
//! Invariant: no indicator value at bar t may depend on bars after t, and in
//! expanding threshold mode neither may the squeeze classification.
//!
//! Method: run on a truncated series (bars 0..150) and on the full series
//! (bars 0..300), then assert the first 150 results are identical.

use chrono::{DateTime, Duration};
use squeezelab_core::indicators::{Atr, Bollinger};
use squeezelab_core::squeeze::quantile::ExpandingQuantile;
use squeezelab_core::{
    compute_indicators, identify_squeeze_periods, Bar, IndicatorParams, SqueezeParams,
    ThresholdMode,
};

/// Deterministic pseudo-random walk with alternating calm and wild stretches.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = DateTime::from_timestamp(1_704_067_200, 0).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let scale = if (i / 40) % 2 == 0 { 0.01 } else { 0.08 };
        let change = ((seed >> 33) % 200) as f64 - 100.0;
        price = (price + change * scale).max(10.0);

        let open = price - 0.2;
        let close = price + 0.1;
        let spread = 0.5 + scale * 10.0;
        bars.push(Bar {
            timestamp: base + Duration::hours(i as i64),
            open,
            high: open.max(close) + spread,
            low: open.min(close) - spread,
            close,
            volume: 1000.0 + i as f64,
        });
    }
    bars
}

const FULL: usize = 300;
const TRUNCATED: usize = 150;

#[test]
fn bollinger_has_no_lookahead() {
    let bars = make_test_bars(FULL);
    let bb = Bollinger::new(20, 2.0).unwrap();
    let full = bb.compute(&bars);
    let truncated = bb.compute(&bars[..TRUNCATED]);

    assert_eq!(truncated.len(), TRUNCATED);
    assert_eq!(&full[..TRUNCATED], &truncated[..]);
}

#[test]
fn atr_has_no_lookahead() {
    let bars = make_test_bars(FULL);
    let atr = Atr::new(14).unwrap();
    let full = atr.compute(&bars);
    let truncated = atr.compute(&bars[..TRUNCATED]);

    assert_eq!(truncated.len(), TRUNCATED);
    assert_eq!(&full[..TRUNCATED], &truncated[..]);
}

#[test]
fn annotated_bars_have_no_lookahead() {
    let bars = make_test_bars(FULL);
    let params = IndicatorParams::default();
    let full = compute_indicators(&bars, &params).unwrap();
    let truncated = compute_indicators(&bars[..TRUNCATED], &params).unwrap();

    assert_eq!(&full[..TRUNCATED], &truncated[..]);
}

#[test]
fn expanding_quantile_has_no_lookahead() {
    let values: Vec<Option<f64>> = make_test_bars(FULL)
        .iter()
        .enumerate()
        .map(|(i, b)| (i % 7 != 0).then_some(b.close))
        .collect();
    let full = ExpandingQuantile::series(&values, 0.1);
    let truncated = ExpandingQuantile::series(&values[..TRUNCATED], 0.1);

    assert_eq!(&full[..TRUNCATED], &truncated[..]);
}

#[test]
fn expanding_classification_has_no_lookahead() {
    let bars = make_test_bars(FULL);
    let params = SqueezeParams {
        threshold_mode: ThresholdMode::Expanding,
        ..SqueezeParams::default()
    };
    let indicators = IndicatorParams::default();

    let full = compute_indicators(&bars, &indicators).unwrap();
    let truncated = compute_indicators(&bars[..TRUNCATED], &indicators).unwrap();
    let full = identify_squeeze_periods(&full, &params).unwrap();
    let truncated = identify_squeeze_periods(&truncated, &params).unwrap();

    for i in 0..TRUNCATED {
        assert_eq!(
            full.bars[i].is_squeeze, truncated.bars[i].is_squeeze,
            "classification at bar {i} changed when later bars were added"
        );
        assert_eq!(full.bars[i].squeeze_start, truncated.bars[i].squeeze_start);
        assert_eq!(full.bars[i].squeeze_end, truncated.bars[i].squeeze_end);
    }
    assert!(full.squeeze_bar_count() > 0, "fixture should contain squeezes");
}

/// Global thresholds are computed over the whole sequence, so appending bars
/// can change earlier classifications. This documents the difference.
#[test]
fn global_classification_depends_on_later_bars() {
    let bars = make_test_bars(FULL);
    let indicators = IndicatorParams::default();
    let params = SqueezeParams::default();

    let full = compute_indicators(&bars, &indicators).unwrap();
    let truncated = compute_indicators(&bars[..TRUNCATED], &indicators).unwrap();
    let full = identify_squeeze_periods(&full, &params).unwrap();
    let truncated = identify_squeeze_periods(&truncated, &params).unwrap();

    assert_ne!(full.thresholds, truncated.thresholds);
}
