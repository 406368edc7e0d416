//! Binance klines data provider.
//!
//! Fetches OHLCV candles from the public `/api/v3/klines` endpoint. The
//! global endpoint answers HTTP 451 from restricted regions, so endpoints are
//! tried in order and the first one that returns data wins. Rate-limited
//! requests back off exponentially before retrying the same endpoint.

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use super::provider::{BarProvider, DataError};
use crate::domain::Bar;

/// Public kline endpoints, in the order they are tried.
pub const DEFAULT_ENDPOINTS: [&str; 2] = [
    "https://api.binance.com/api/v3/klines",
    "https://api.binance.us/api/v3/klines",
];

/// Binance caps a single klines request at this many candles.
pub const MAX_LIMIT: usize = 1000;

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    endpoints: Vec<String>,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_endpoints(DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_endpoints(endpoints: Vec<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoints,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// One endpoint, with retry on HTTP 429.
    fn fetch_from(
        &self,
        endpoint: &str,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let limit = limit.min(MAX_LIMIT).to_string();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            let resp = self
                .client
                .get(endpoint)
                .query(&[
                    ("symbol", symbol),
                    ("interval", interval),
                    ("limit", limit.as_str()),
                ])
                .send()
                .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

            let status = resp.status();
            if status == reqwest::StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS {
                return Err(DataError::RegionRestricted(endpoint.to_string()));
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                last_error = Some(DataError::Other(format!("rate limited by {endpoint}")));
                continue;
            }
            if !status.is_success() {
                return Err(DataError::Other(format!("HTTP {status} from {endpoint}")));
            }

            let rows: Vec<Vec<Value>> = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse klines for {symbol}: {e}"
                ))
            })?;
            return parse_klines(symbol, &rows);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl BarProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Bar>, DataError> {
        let mut last_error = None;
        for endpoint in &self.endpoints {
            info!(endpoint = endpoint.as_str(), symbol, interval, limit, "fetching klines");
            match self.fetch_from(endpoint, symbol, interval, limit) {
                Ok(bars) => return Ok(bars),
                Err(e) => {
                    warn!(
                        endpoint = endpoint.as_str(),
                        error = %e,
                        "kline endpoint failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| DataError::Other("no endpoints configured".into())))
    }
}

/// Convert kline rows to bars.
///
/// Row layout: `[open_time_ms, "open", "high", "low", "close", "volume", ...]`.
/// Prices arrive as strings; plain JSON numbers are accepted too.
pub fn parse_klines(symbol: &str, rows: &[Vec<Value>]) -> Result<Vec<Bar>, DataError> {
    let bars = rows
        .iter()
        .enumerate()
        .map(|(i, row)| parse_kline_row(i, row))
        .collect::<Result<Vec<Bar>, DataError>>()?;

    if bars.is_empty() {
        return Err(DataError::Empty {
            symbol: symbol.to_string(),
        });
    }
    Ok(bars)
}

fn parse_kline_row(index: usize, row: &[Value]) -> Result<Bar, DataError> {
    if row.len() < 6 {
        return Err(DataError::ResponseFormatChanged(format!(
            "kline {index} has {} fields, expected at least 6",
            row.len()
        )));
    }

    let timestamp = row[0]
        .as_i64()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("kline {index}: bad open time {}", row[0]))
        })?;

    let number = |pos: usize| -> Result<f64, DataError> {
        let value = &row[pos];
        value
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| value.as_f64())
            .ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("kline {index}: bad number {value}"))
            })
    };

    Ok(Bar {
        timestamp,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
    })
}
