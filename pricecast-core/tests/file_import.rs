//! Integration tests for the CSV and Parquet file provider.

use chrono::{DateTime, Duration, TimeZone, Utc};
use polars::prelude::*;
use pricecast_core::data::{DataError, DataProvider, DisplayPeriod, FileProvider};
use pricecast_core::domain::{Bar, OhlcvTable};
use std::fs::File;
use std::io::Write;

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

fn bars(n: u32) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64;
            Bar {
                timestamp: day(1 + i),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000.0 * (i + 1) as f64,
            }
        })
        .collect()
}

#[test]
fn csv_with_symbol_column_filters_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bars.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "date,symbol,open,high,low,close,volume").unwrap();
    writeln!(file, "2024-01-02,AAPL,10,11,9,10.5,100").unwrap();
    writeln!(file, "2024-01-02,MSFT,20,21,19,20.5,200").unwrap();
    writeln!(file, "2024-01-03,aapl,10.5,12,10,11.5,150").unwrap();
    writeln!(file, "2024-01-04,AAPL,11.5,12,11,,120").unwrap();
    drop(file);

    let provider = FileProvider::new(&path);
    let table = provider.load("AAPL").unwrap();

    // The row with a missing close is dropped.
    assert_eq!(table.len(), 2);
    assert_eq!(table.symbol(), "AAPL");
    assert_eq!(table.closes(), vec![10.5, 11.5]);
    assert_eq!(table.first().unwrap().timestamp, day(2));

    let msft = provider.load("MSFT").unwrap();
    assert_eq!(msft.closes(), vec![20.5]);
    assert!(provider.load("TSLA").unwrap().is_empty());
}

#[test]
fn parquet_round_trips_a_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bars.parquet");
    let table = OhlcvTable::new("SPY", bars(10));

    let mut df = table.to_dataframe().unwrap();
    let mut file = File::create(&path).unwrap();
    ParquetWriter::new(&mut file).finish(&mut df).unwrap();
    drop(file);

    let loaded = FileProvider::new(&path).load("SPY").unwrap();
    assert_eq!(loaded.bars(), table.bars());
    assert_eq!(loaded.fingerprint(), table.fingerprint());
}

#[test]
fn range_fetch_is_half_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bars.parquet");
    let mut df = OhlcvTable::new("SPY", bars(10)).to_dataframe().unwrap();
    let mut file = File::create(&path).unwrap();
    ParquetWriter::new(&mut file).finish(&mut df).unwrap();
    drop(file);

    let provider = FileProvider::new(&path);
    let table = provider.fetch("SPY", day(3), day(6)).unwrap();
    let days: Vec<_> = table.bars().iter().map(|b| b.timestamp).collect();
    assert_eq!(days, vec![day(3), day(4), day(5)]);
}

#[test]
fn display_period_is_anchored_on_newest_bar() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bars.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
    for i in 0..40 {
        let ts = day(1) + Duration::days(i);
        writeln!(file, "{},1,2,0.5,1.5,10", ts.format("%Y-%m-%d")).unwrap();
    }
    drop(file);

    let provider = FileProvider::new(&path);
    let five_days = provider
        .history("ANY", &DisplayPeriod::FiveDays.request())
        .unwrap();
    assert!(!five_days.is_empty());
    assert!(five_days.len() <= 5);
    assert_eq!(five_days.last().unwrap().timestamp, day(1) + Duration::days(39));
}

#[test]
fn missing_columns_and_files_are_import_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "date,open,close\n2024-01-02,1,2\n").unwrap();
    assert!(matches!(
        FileProvider::new(&path).load("X"),
        Err(DataError::Import(_))
    ));

    let missing = dir.path().join("nope.parquet");
    assert!(matches!(
        FileProvider::new(&missing).load("X"),
        Err(DataError::Import(_))
    ));
}
