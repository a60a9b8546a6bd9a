//! OHLCV table: an ordered, immutable run of bars for one symbol.

use super::bar::{Bar, FEATURE_COUNT};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use polars::prelude::{Column, DataFrame, DataType, PolarsResult, TimeUnit};
use serde::{Deserialize, Serialize};

/// Bars for a single symbol, ascending by timestamp.
///
/// Built once by a data provider and then only read. The feature matrix view
/// is what the forecast pipeline consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvTable {
    symbol: String,
    bars: Vec<Bar>,
}

impl OhlcvTable {
    /// Build a table, sorting bars by timestamp.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    /// A table with no rows (unknown symbol, empty range).
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The most recent `n` bars (all of them if fewer exist).
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    /// Close prices in time order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// A new table restricted to bars with `start <= timestamp < end`.
    pub fn within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.timestamp >= start && b.timestamp < end)
                .cloned()
                .collect(),
        }
    }

    /// `L × 5` feature matrix in canonical column order.
    pub fn feature_matrix(&self) -> Array2<f64> {
        features_of(&self.bars)
    }

    /// BLAKE3 hex digest over timestamps and OHLCV values.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for bar in &self.bars {
            hasher.update(&bar.timestamp.timestamp().to_le_bytes());
            for value in bar.features() {
                hasher.update(&value.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Convert to a Polars DataFrame with a millisecond `timestamp` column.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let timestamps: Vec<i64> = self
            .bars
            .iter()
            .map(|b| b.timestamp.timestamp_millis())
            .collect();
        let bars = &self.bars;

        DataFrame::new(vec![
            Column::new("timestamp".into(), timestamps)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
            Column::new("open".into(), column_of(bars, |b| b.open)),
            Column::new("high".into(), column_of(bars, |b| b.high)),
            Column::new("low".into(), column_of(bars, |b| b.low)),
            Column::new("close".into(), column_of(bars, |b| b.close)),
            Column::new("volume".into(), column_of(bars, |b| b.volume)),
        ])
    }
}

fn column_of(bars: &[Bar], f: impl Fn(&Bar) -> f64) -> Vec<f64> {
    bars.iter().map(f).collect()
}

/// Stack bar features into an `n × 5` matrix.
pub fn features_of(bars: &[Bar]) -> Array2<f64> {
    let mut matrix = Array2::zeros((bars.len(), FEATURE_COUNT));
    for (mut row, bar) in matrix.rows_mut().into_iter().zip(bars) {
        for (cell, value) in row.iter_mut().zip(bar.features()) {
            *cell = value;
        }
    }
    matrix
}
