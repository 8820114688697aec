//! Tabular OHLCV ingestion with schema validation.
//!
//! Each input series must carry `datetime, open, high, low, close, volume`
//! columns; header names are matched after lowercasing and trimming, so
//! `" Close "` and `close` resolve to the same column. A missing column
//! fails with a [`SpreadAnalysisError::SchemaError`] naming every absent
//! column before any computation runs.

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{SpreadAnalysisError, SpreadResult};

/// Required columns for each input series.
pub const REQUIRED_COLUMNS: [&str; 6] = ["datetime", "open", "high", "low", "close", "volume"];

/// One raw OHLCV row after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OhlcvRecord {
    /// Row timestamp (intraday precision preserved)
    pub timestamp: NaiveDateTime,
    /// Opening price
    pub open: f64,
    /// Session high
    pub high: f64,
    /// Session low
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: f64,
}

impl OhlcvRecord {
    /// Calendar date of this row.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Load an OHLCV series from a CSV file.
///
/// `label` identifies the series in error messages and log lines
/// (typically the file name).
pub fn load_ohlcv_series<P: AsRef<Path>>(path: P, label: &str) -> SpreadResult<Vec<OhlcvRecord>> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| SpreadAnalysisError::IoError {
        operation: format!("open {}", path.as_ref().display()),
        source: std::sync::Arc::new(e),
    })?;
    parse_ohlcv_csv(file, label)
}

/// Parse an OHLCV series from any CSV reader.
///
/// Rows are returned sorted ascending by timestamp regardless of input
/// order.
pub fn parse_ohlcv_csv<R: Read>(input: R, label: &str) -> SpreadResult<Vec<OhlcvRecord>> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b',').from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| SpreadAnalysisError::ParseError {
            label: label.to_string(),
            reason: format!("unreadable header row: {}", e),
        })?
        .clone();

    // Normalize header names: lowercase + trim
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut columns = [0usize; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS.iter()) {
        match normalized.iter().position(|h| h == name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(SpreadAnalysisError::SchemaError {
            label: label.to_string(),
            missing,
        });
    }

    let [dt_col, open_col, high_col, low_col, close_col, volume_col] = columns;

    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| SpreadAnalysisError::ParseError {
            label: label.to_string(),
            reason: format!("row {}: {}", row_idx + 1, e),
        })?;

        let raw_dt = record.get(dt_col).unwrap_or("");
        let timestamp = parse_timestamp(raw_dt).ok_or_else(|| SpreadAnalysisError::ParseError {
            label: label.to_string(),
            reason: format!("row {}: unparseable datetime '{}'", row_idx + 1, raw_dt),
        })?;

        let field = |col: usize, name: &str| -> SpreadResult<f64> {
            let raw = record.get(col).unwrap_or("").trim();
            raw.parse::<f64>()
                .map_err(|_| SpreadAnalysisError::ParseError {
                    label: label.to_string(),
                    reason: format!("row {}: unparseable {} '{}'", row_idx + 1, name, raw),
                })
        };

        records.push(OhlcvRecord {
            timestamp,
            open: field(open_col, "open")?,
            high: field(high_col, "high")?,
            low: field(low_col, "low")?,
            close: field(close_col, "close")?,
            volume: field(volume_col, "volume")?,
        });
    }

    records.sort_by_key(|r| r.timestamp);
    Ok(records)
}

/// Parse a timestamp in the formats daily exports actually use.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}
