//! Content fingerprints for datasets and engine output.
//!
//! Hashes are BLAKE3 over a fixed little-endian encoding of each field, so two
//! runs agree on a fingerprint only if their values are bit-identical.

use blake3::Hasher;

use crate::domain::{Bar, OutcomeRecord};
use crate::summary::SummaryRow;

/// Fingerprint of a bar sequence.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(&(bars.len() as u64).to_le_bytes());
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_bits().to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Fingerprint of the outcome and summary tables.
pub fn output_hash(outcomes: &[OutcomeRecord], summary: &[SummaryRow]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(&(outcomes.len() as u64).to_le_bytes());
    for r in outcomes {
        for t in [
            r.squeeze_start_time,
            r.squeeze_end_time,
            r.breakout_time,
            r.exit_time,
        ] {
            hasher.update(&t.timestamp_millis().to_le_bytes());
        }
        for n in [r.breakout_index, r.exit_index, r.hold_period, r.squeeze_duration] {
            hasher.update(&(n as u64).to_le_bytes());
        }
        hasher.update(r.direction.as_str().as_bytes());
        for v in [r.pct_change, r.max_up_pct, r.max_down_pct] {
            update_opt(&mut hasher, v);
        }
    }

    hasher.update(&(summary.len() as u64).to_le_bytes());
    for row in summary {
        hasher.update(&(row.hold_period as u64).to_le_bytes());
        hasher.update(row.direction.as_str().as_bytes());
        hasher.update(&(row.count as u64).to_le_bytes());
        for v in [
            row.pct_change_mean,
            row.pct_change_median,
            row.pct_change_std,
            row.pct_change_min,
            row.pct_change_max,
            row.max_up_pct_mean,
            row.max_up_pct_max,
            row.max_down_pct_mean,
            row.max_down_pct_min,
        ] {
            update_opt(&mut hasher, v);
        }
    }
    hasher.finalize().to_hex().to_string()
}

fn update_opt(hasher: &mut Hasher, value: Option<f64>) {
    match value {
        Some(v) => {
            hasher.update(&[1]);
            hasher.update(&v.to_bits().to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}
