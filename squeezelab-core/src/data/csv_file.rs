//! CSV bar files.
//!
//! Reading accepts a header row with case-insensitive names: a time column
//! (`timestamp` or `date`) plus `open`, `high`, `low`, `close`, `volume`.
//! Extra columns are ignored. Writing always produces
//! `timestamp,open,high,low,close,volume` with RFC 3339 UTC timestamps.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::provider::DataError;
use crate::domain::Bar;

const TIME_COLUMNS: [&str; 2] = ["timestamp", "date"];
const VALUE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Read bars from a CSV file in file order.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_bars(file)
}

/// Read bars from any CSV source in source order.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_lowercase).collect();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let time_idx = TIME_COLUMNS
        .iter()
        .find_map(|&name| find(name))
        .ok_or_else(|| DataError::MissingColumn(TIME_COLUMNS.join("|")))?;
    let mut value_idx = [0usize; 5];
    for (slot, name) in value_idx.iter_mut().zip(VALUE_COLUMNS) {
        *slot = find(name).ok_or_else(|| DataError::MissingColumn(name.to_string()))?;
    }

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let raw_time = field(time_idx);
        let timestamp = parse_timestamp(raw_time).ok_or_else(|| DataError::Parse {
            row,
            column: headers[time_idx].clone(),
            value: raw_time.to_string(),
        })?;

        let mut values = [0.0f64; 5];
        for (value, (&idx, name)) in values.iter_mut().zip(value_idx.iter().zip(VALUE_COLUMNS)) {
            let raw = field(idx);
            *value = raw.parse::<f64>().map_err(|_| DataError::Parse {
                row,
                column: name.to_string(),
                value: raw.to_string(),
            })?;
        }
        let [open, high, low, close, volume] = values;

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(bars)
}

/// Write bars to a CSV file, creating parent directories as needed.
pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DataError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_bars(file, bars)
}

/// Write bars as CSV to any sink.
pub fn write_bars<W: Write>(writer: W, bars: &[Bar]) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        wtr.write_record([
            bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    wtr.flush().map_err(|e| DataError::Csv(e.into()))?;
    Ok(())
}

/// Parse a timestamp cell.
///
/// Accepts integer epochs (up to 10 digits as seconds, 11 to 13 as
/// milliseconds, anything longer is rejected), RFC 3339, `YYYY-MM-DD HH:MM:SS`
/// (optionally with fractional seconds or a `T` separator), and plain dates.
/// Zone-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let value = raw.parse::<i64>().ok()?;
        return match raw.len() {
            0..=10 => DateTime::from_timestamp(value, 0),
            11..=13 => DateTime::from_timestamp_millis(value),
            _ => None,
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01 12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T13:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("1709294400000"), Some(expected));
        assert_eq!(parse_timestamp("1709294400"), Some(expected));
        assert_eq!(parse_timestamp("1709294400000000"), None);
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn reads_case_insensitive_headers_and_date_column() {
        let data = "Date,Open,High,Low,Close,Volume,Extra\n\
                    2024-01-01,100,105,99,104,1500,x\n\
                    2024-01-02,104,106,101,102,900,y\n";
        let bars = read_bars(data.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].high, 105.0);
        assert_eq!(bars[1].close, 102.0);
        assert_eq!(bars[1].volume, 900.0);
    }

    #[test]
    fn missing_column_is_reported() {
        let data = "timestamp,open,high,low,close\n2024-01-01,1,1,1,1\n";
        match read_bars(data.as_bytes()) {
            Err(DataError::MissingColumn(col)) => assert_eq!(col, "volume"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn bad_number_is_reported_with_row() {
        let data = "timestamp,open,high,low,close,volume\n\
                    2024-01-01,1,1,1,1,1\n\
                    2024-01-02,1,abc,1,1,1\n";
        match read_bars(data.as_bytes()) {
            Err(DataError::Parse { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "high");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn write_then_read_preserves_bars() {
        let bars = vec![Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap(),
            open: 42_000.5,
            high: 42_100.25,
            low: 41_900.125,
            close: 42_050.0,
            volume: 12.345678,
        }];
        let mut buf = Vec::new();
        write_bars(&mut buf, &bars).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("timestamp,open,high,low,close,volume\n"));
        assert!(text.contains("2024-01-01T05:00:00Z"));
        assert_eq!(read_bars(buf.as_slice()).unwrap(), bars);
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/bars.csv");
        write_bars_csv(&path, &[]).unwrap();
        assert!(path.exists());
        assert!(read_bars_csv(&path).unwrap().is_empty());
    }
}
