//! Breakout Sampler.
//!
//! For each closed squeeze region, the bar right after it is the breakout
//! bar. Its close against the region's last bands gives the direction, and
//! price is sampled `h` bars after the breakout bar for each hold period `h`.
//!
//! Regions are independent once the annotated sequence exists, so they are
//! sampled in parallel over a shared read-only slice. Output order is region
//! order, then hold-period order.

use rayon::prelude::*;
use tracing::info;

use crate::domain::{AnnotatedBar, BreakoutDirection, OutcomeRecord, SqueezeRegion};
use crate::error::EngineError;

/// Default hold horizons in bars: 1h, 4h, 12h, 1d, 1w on hourly data.
pub const DEFAULT_HOLD_PERIODS: [usize; 5] = [1, 4, 12, 24, 168];

/// Sample outcomes for every region at every hold period.
///
/// Regions without a breakout bar, and horizons that run past the end of the
/// data, produce no records.
pub fn run_breakout_tests(
    bars: &[AnnotatedBar],
    regions: &[SqueezeRegion],
    hold_periods: &[usize],
) -> Result<Vec<OutcomeRecord>, EngineError> {
    if let Some(&bad) = hold_periods.iter().find(|&&h| h == 0) {
        return Err(EngineError::InvalidHorizon(bad));
    }

    let per_region: Vec<Vec<OutcomeRecord>> = regions
        .par_iter()
        .map(|region| sample_region(bars, region, hold_periods))
        .collect();
    let records: Vec<OutcomeRecord> = per_region.into_iter().flatten().collect();

    info!(
        regions = regions.len(),
        records = records.len(),
        "breakout tests complete"
    );
    Ok(records)
}

fn sample_region(
    bars: &[AnnotatedBar],
    region: &SqueezeRegion,
    hold_periods: &[usize],
) -> Vec<OutcomeRecord> {
    let breakout_index = region.breakout_index();
    let Some(breakout) = bars.get(breakout_index) else {
        return Vec::new();
    };
    let direction =
        BreakoutDirection::classify(breakout.bar.close, region.ref_upper, region.ref_lower);

    hold_periods
        .iter()
        .filter_map(|&hold_period| {
            let exit_index = breakout_index.checked_add(hold_period)?;
            let exit = bars.get(exit_index)?;
            let window = &bars[breakout_index..=exit_index];

            let max_high = window
                .iter()
                .map(|b| b.bar.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let min_low = window
                .iter()
                .map(|b| b.bar.low)
                .fold(f64::INFINITY, f64::min);

            Some(OutcomeRecord {
                squeeze_start_time: region.start_time,
                squeeze_end_time: region.end_time,
                breakout_time: breakout.timestamp(),
                exit_time: exit.timestamp(),
                breakout_index,
                exit_index,
                direction,
                hold_period,
                pct_change: percent_move(region.ref_price, exit.bar.close),
                max_up_pct: percent_move(region.ref_price, max_high),
                max_down_pct: percent_move(region.ref_price, min_low),
                squeeze_duration: region.duration,
            })
        })
        .collect()
}

/// Percent move from `reference` to `price`; `None` for a zero reference.
pub fn percent_move(reference: f64, price: f64) -> Option<f64> {
    if reference == 0.0 {
        return None;
    }
    let pct = (price - reference) / reference * 100.0;
    pct.is_finite().then_some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bands, Bar};
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    /// Flat bars at 100 with a single squeeze region covering `start..=end`.
    fn setup(n: usize, start: usize, end: usize) -> (Vec<AnnotatedBar>, SqueezeRegion) {
        let base = chrono::DateTime::from_timestamp(1_704_067_200, 0).unwrap();
        let bars: Vec<AnnotatedBar> = (0..n)
            .map(|i| {
                let bar = Bar {
                    timestamp: base + chrono::Duration::hours(i as i64),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.0,
                    volume: 1.0,
                };
                let in_region = (start..=end).contains(&i);
                AnnotatedBar {
                    bands: Some(Bands {
                        mid: 100.0,
                        upper: 102.0,
                        lower: 98.0,
                        std_dev: 1.0,
                    }),
                    is_squeeze: Some(in_region),
                    ..AnnotatedBar::new(bar)
                }
            })
            .collect();
        let region = SqueezeRegion::from_run(&bars, start, end).unwrap();
        (bars, region)
    }

    #[test]
    fn direction_from_breakout_close() {
        let (mut bars, region) = setup(10, 2, 4);
        bars[5].bar.close = 103.0;
        bars[5].bar.high = 103.5;
        let records = run_breakout_tests(&bars, &[region.clone()], &[1]).unwrap();
        assert_eq!(records[0].direction, BreakoutDirection::Up);

        bars[5].bar.close = 97.0;
        bars[5].bar.low = 96.5;
        let records = run_breakout_tests(&bars, &[region.clone()], &[1]).unwrap();
        assert_eq!(records[0].direction, BreakoutDirection::Down);

        bars[5].bar.close = 100.5;
        let records = run_breakout_tests(&bars, &[region], &[1]).unwrap();
        assert_eq!(records[0].direction, BreakoutDirection::Expansion);
    }

    #[test]
    fn pct_change_and_excursions() {
        let (mut bars, region) = setup(10, 2, 4);
        // reference close = 100 at bar 4; breakout bar 5, exit bar 7 for h=2
        bars[5].bar.high = 105.0;
        bars[6].bar.low = 96.0;
        bars[7].bar.close = 101.0;
        bars[8].bar.high = 120.0; // outside the h=2 window
        let records = run_breakout_tests(&bars, &[region], &[2]).unwrap();

        let r = &records[0];
        assert_eq!(r.breakout_index, 5);
        assert_eq!(r.exit_index, 7);
        assert_approx(r.pct_change.unwrap(), 1.0, DEFAULT_EPSILON);
        assert_approx(r.max_up_pct.unwrap(), 5.0, DEFAULT_EPSILON);
        assert_approx(r.max_down_pct.unwrap(), -4.0, DEFAULT_EPSILON);
        assert_eq!(r.squeeze_duration, 3);
        assert_eq!(r.breakout_time, bars[5].timestamp());
        assert_eq!(r.exit_time, bars[7].timestamp());
    }

    #[test]
    fn horizon_past_end_is_skipped() {
        // region ends at 4, breakout at 5, 10 bars remain after breakout
        let (bars, region) = setup(16, 2, 4);
        let records = run_breakout_tests(&bars, &[region], &[1, 4, 24]).unwrap();
        let horizons: Vec<usize> = records.iter().map(|r| r.hold_period).collect();
        assert_eq!(horizons, vec![1, 4]);
    }

    #[test]
    fn overflowing_horizon_is_skipped() {
        let (bars, region) = setup(16, 2, 4);
        let records = run_breakout_tests(&bars, &[region], &[1, usize::MAX]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hold_period, 1);
        assert!(records.iter().all(|r| r.exit_index > r.breakout_index));
    }

    #[test]
    fn exit_on_last_bar_is_kept() {
        let (bars, region) = setup(8, 2, 4);
        // breakout 5, h=2 → exit 7 = last bar
        let records = run_breakout_tests(&bars, &[region], &[2, 3]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exit_index, 7);
    }

    #[test]
    fn region_without_breakout_bar_yields_nothing() {
        let (bars, region) = setup(5, 2, 4);
        assert!(region.is_open(bars.len()));
        let records = run_breakout_tests(&bars, &[region], &DEFAULT_HOLD_PERIODS).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn records_ordered_by_region_then_horizon() {
        let (bars, first) = setup(40, 2, 4);
        let second = SqueezeRegion::from_run(&bars, 10, 12).unwrap();
        let records = run_breakout_tests(&bars, &[first, second], &[4, 1]).unwrap();
        let keys: Vec<(usize, usize)> = records
            .iter()
            .map(|r| (r.breakout_index, r.hold_period))
            .collect();
        assert_eq!(keys, vec![(5, 4), (5, 1), (13, 4), (13, 1)]);
    }

    #[test]
    fn zero_reference_price_is_undefined() {
        let (mut bars, _) = setup(10, 2, 4);
        bars[4].bar.close = 0.0;
        bars[4].bar.low = 0.0;
        let region = SqueezeRegion::from_run(&bars, 2, 4).unwrap();
        let records = run_breakout_tests(&bars, &[region], &[1]).unwrap();
        assert_eq!(records[0].pct_change, None);
        assert_eq!(records[0].max_up_pct, None);
        assert_eq!(records[0].max_down_pct, None);
    }

    #[test]
    fn zero_horizon_rejected() {
        let (bars, region) = setup(10, 2, 4);
        assert_eq!(
            run_breakout_tests(&bars, &[region], &[1, 0]),
            Err(EngineError::InvalidHorizon(0))
        );
    }

    #[test]
    fn percent_move_basic() {
        assert_approx(percent_move(100.0, 110.0).unwrap(), 10.0, DEFAULT_EPSILON);
        assert_eq!(percent_move(0.0, 1.0), None);
    }
}
