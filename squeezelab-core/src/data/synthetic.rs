//! Deterministic synthetic bar generator.
//!
//! Produces a random walk that alternates between calm and volatile regimes,
//! so the series contains low-volatility compressions followed by expansions.
//! Used as an offline fallback when no CSV or network data is available.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub bars: usize,
    pub seed: u64,
    pub start: DateTime<Utc>,
    pub step: Duration,
    pub start_price: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bars: 2000,
            seed: 42,
            // 2024-01-01T00:00:00Z
            start: DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default(),
            step: Duration::hours(1),
            start_price: 30_000.0,
        }
    }
}

/// Regime lengths are drawn from this range, in bars.
const REGIME_LEN: std::ops::Range<usize> = 24..120;

/// Generate `config.bars` sane, strictly increasing bars.
pub fn generate_synthetic_bars(config: &SyntheticConfig) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut bars = Vec::with_capacity(config.bars);
    let mut price = config.start_price.max(1.0);
    let mut timestamp = config.start;

    let mut calm = true;
    let mut remaining = rng.gen_range(REGIME_LEN);

    for _ in 0..config.bars {
        if remaining == 0 {
            calm = !calm;
            remaining = rng.gen_range(REGIME_LEN);
        }
        remaining -= 1;

        let vol = if calm { 0.002 } else { 0.012 };
        let bar_return: f64 = rng.gen_range(-vol..vol);
        let open = price;
        let close = (price * (1.0 + bar_return)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..vol / 2.0));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..vol / 2.0));
        let volume = rng.gen_range(50.0..500.0) * if calm { 1.0 } else { 3.0 };

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        timestamp += config.step;
    }

    bars
}
