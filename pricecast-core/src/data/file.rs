//! File import provider for CSV and Parquet bar files.
//!
//! Expected columns: `timestamp` (or `date`), `open`, `high`, `low`, `close`,
//! `volume`, and optionally `symbol`. When a `symbol` column is present only
//! matching rows are returned, so one file can hold several tickers.

use super::period::HistoryRequest;
use super::provider::{validate_request, DataError, DataProvider, DataSource};
use crate::domain::{Bar, OhlcvTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Reads bars from a local CSV or Parquet file on every request.
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every row for `symbol`, ascending by timestamp.
    pub fn load(&self, symbol: &str) -> Result<OhlcvTable, DataError> {
        let df = read_frame(&self.path)?;
        frame_to_table(&df, symbol)
    }
}

impl DataProvider for FileProvider {
    fn name(&self) -> &str {
        "file_import"
    }

    fn source(&self) -> DataSource {
        DataSource::FileImport
    }

    fn history(&self, symbol: &str, request: &HistoryRequest) -> Result<OhlcvTable, DataError> {
        validate_request(symbol, request)?;
        let table = self.load(symbol)?;

        let table = match request {
            HistoryRequest::Range { start, end } => table.within(*start, *end),
            // Named periods are anchored on the newest bar in the file.
            HistoryRequest::Period { period, interval } => match table.last() {
                Some(last) => {
                    let end = last.timestamp + interval.duration();
                    table.within(period.start_before(end), end)
                }
                None => table,
            },
        };

        info!(
            symbol,
            bars = table.len(),
            path = %self.path.display(),
            "loaded history from file"
        );
        Ok(table)
    }
}

fn import_err(e: PolarsError) -> DataError {
    DataError::Import(e.to_string())
}

/// Read a CSV or Parquet file into a DataFrame, by extension.
fn read_frame(path: &Path) -> Result<DataFrame, DataError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|opts| opts.with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(import_err)?
            .finish()
            .map_err(import_err),
        Some("parquet") => {
            let file = File::open(path)
                .map_err(|e| DataError::Import(format!("{}: {e}", path.display())))?;
            ParquetReader::new(file).finish().map_err(import_err)
        }
        _ => Err(DataError::Import(format!(
            "unsupported file type: {} (expected .csv or .parquet)",
            path.display()
        ))),
    }
}

/// Convert a bar DataFrame into a table for one symbol.
fn frame_to_table(df: &DataFrame, symbol: &str) -> Result<OhlcvTable, DataError> {
    let timestamps = timestamp_column(df)?;
    let open = f64_column(df, "open")?;
    let high = f64_column(df, "high")?;
    let low = f64_column(df, "low")?;
    let close = f64_column(df, "close")?;
    let volume = f64_column(df, "volume")?;
    let symbols = symbol_column(df)?;

    let mut bars = Vec::with_capacity(df.height());
    let mut dropped = 0usize;

    for i in 0..df.height() {
        if let Some(symbols) = &symbols {
            match &symbols[i] {
                Some(s) if s.eq_ignore_ascii_case(symbol) => {}
                _ => continue,
            }
        }

        let (Some(timestamp), Some(open), Some(high), Some(low), Some(close), Some(volume)) =
            (timestamps[i], open[i], high[i], low[i], close[i], volume[i])
        else {
            dropped += 1;
            continue;
        };

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if dropped > 0 {
        warn!(symbol, dropped, "dropped rows with missing fields");
    }

    Ok(OhlcvTable::new(symbol, bars))
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DataError> {
    let column = df
        .column(name)
        .map_err(import_err)?
        .cast(&DataType::Float64)
        .map_err(import_err)?;
    let values = column
        .as_materialized_series()
        .f64()
        .map_err(import_err)?
        .into_iter()
        .collect();
    Ok(values)
}

fn symbol_column(df: &DataFrame) -> Result<Option<Vec<Option<String>>>, DataError> {
    let Ok(column) = df.column("symbol") else {
        return Ok(None);
    };
    let column = column.cast(&DataType::String).map_err(import_err)?;
    let values = column
        .as_materialized_series()
        .str()
        .map_err(import_err)?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(Some(values))
}

/// Timestamps from a string, date, datetime, or integer (epoch seconds) column.
fn timestamp_column(df: &DataFrame) -> Result<Vec<Option<DateTime<Utc>>>, DataError> {
    let column = df
        .column("timestamp")
        .or_else(|_| df.column("date"))
        .map_err(|_| DataError::Import("missing 'timestamp' or 'date' column".into()))?;

    match column.dtype() {
        DataType::String => {
            let values = column
                .as_materialized_series()
                .str()
                .map_err(import_err)?
                .into_iter()
                .map(|v| v.and_then(parse_timestamp))
                .collect();
            Ok(values)
        }
        DataType::Date | DataType::Datetime(_, _) => {
            let millis = column
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .and_then(|c| c.cast(&DataType::Int64))
                .map_err(import_err)?;
            let values = millis
                .as_materialized_series()
                .i64()
                .map_err(import_err)?
                .into_iter()
                .map(|v| v.and_then(DateTime::<Utc>::from_timestamp_millis))
                .collect();
            Ok(values)
        }
        dtype if dtype.is_integer() => {
            let secs = column.cast(&DataType::Int64).map_err(import_err)?;
            let values = secs
                .as_materialized_series()
                .i64()
                .map_err(import_err)?
                .into_iter()
                .map(|v| v.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0)))
                .collect();
            Ok(values)
        }
        other => Err(DataError::Import(format!(
            "unsupported timestamp column type: {other}"
        ))),
    }
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC), or a bare `YYYY-MM-DD` (midnight UTC).
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
