//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of model features carried by a bar.
pub const FEATURE_COUNT: usize = 5;

/// Canonical feature order: open, high, low, close, volume.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["open", "high", "low", "close", "volume"];

/// Column index of the close price in the feature matrix.
pub const CLOSE_COLUMN: usize = 3;

/// OHLCV bar for a single symbol over one interval (a day or an intraday slot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// The five model features in canonical order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [self.open, self.high, self.low, self.close, self.volume]
    }

    /// Returns true if any OHLCV field is non-finite.
    pub fn is_void(&self) -> bool {
        self.features().iter().any(|v| !v.is_finite())
    }

    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}
