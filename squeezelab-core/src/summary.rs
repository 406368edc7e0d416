//! Outcome Summarizer: per (horizon, direction) statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{BreakoutDirection, OutcomeRecord};

/// Aggregate of every outcome record sharing a hold period and direction.
///
/// Statistics skip undefined percentages; a statistic is `None` when no
/// defined value remains (or, for `pct_change_std`, fewer than two).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub hold_period: usize,
    pub direction: BreakoutDirection,
    pub count: usize,
    pub pct_change_mean: Option<f64>,
    pub pct_change_median: Option<f64>,
    pub pct_change_std: Option<f64>,
    pub pct_change_min: Option<f64>,
    pub pct_change_max: Option<f64>,
    pub max_up_pct_mean: Option<f64>,
    pub max_up_pct_max: Option<f64>,
    pub max_down_pct_mean: Option<f64>,
    pub max_down_pct_min: Option<f64>,
}

/// Group records by (hold period, direction) and summarize each group.
///
/// Rows come out sorted by hold period, then direction. Empty groups are
/// never emitted.
pub fn summarize_results(records: &[OutcomeRecord]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(usize, BreakoutDirection), Vec<&OutcomeRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.hold_period, record.direction))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|((hold_period, direction), group)| {
            let pct: Vec<f64> = group.iter().filter_map(|r| r.pct_change).collect();
            let up: Vec<f64> = group.iter().filter_map(|r| r.max_up_pct).collect();
            let down: Vec<f64> = group.iter().filter_map(|r| r.max_down_pct).collect();
            SummaryRow {
                hold_period,
                direction,
                count: group.len(),
                pct_change_mean: mean(&pct),
                pct_change_median: median(&pct),
                pct_change_std: sample_std(&pct),
                pct_change_min: min(&pct),
                pct_change_max: max(&pct),
                max_up_pct_mean: mean(&up),
                max_up_pct_max: max(&up),
                max_down_pct_mean: mean(&down),
                max_down_pct_min: min(&down),
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
