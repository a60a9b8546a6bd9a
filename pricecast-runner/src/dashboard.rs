//! Dashboard figures: the price header and key-statistics tiles.

use serde::{Deserialize, Serialize};
use tracing::info;

use pricecast_core::data::{DataProvider, DisplayPeriod, SymbolProfile};
use pricecast_core::domain::OhlcvTable;

use crate::pipeline::PipelineError;

/// Symbols suggested when a lookup comes back empty.
pub const COMMON_SYMBOLS: [&str; 10] = [
    "AAPL", "MSFT", "AMZN", "GOOGL", "FB", "TSLA", "NVDA", "JPM", "JNJ", "V",
];

/// Headline numbers for one symbol, computed from the latest session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    pub long_name: String,
    pub currency: String,
    pub current_price: f64,
    /// Current price minus the session's first open.
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// 0 when the source has no P/E.
    pub trailing_pe: f64,
}

impl Snapshot {
    /// Build from a one-day table. `None` when the table is empty.
    pub fn from_table(table: &OhlcvTable, profile: &SymbolProfile) -> Option<Self> {
        let first = table.first()?;
        let last = table.last()?;

        let change = last.close - first.open;
        let change_percent = if first.open != 0.0 {
            change / first.open * 100.0
        } else {
            0.0
        };

        Some(Self {
            symbol: table.symbol().to_string(),
            long_name: profile
                .long_name
                .clone()
                .unwrap_or_else(|| table.symbol().to_string()),
            currency: profile.currency.clone().unwrap_or_else(|| "USD".into()),
            current_price: last.close,
            change,
            change_percent,
            open: first.open,
            high: first.high,
            low: first.low,
            trailing_pe: profile.trailing_pe.unwrap_or(0.0),
        })
    }

    pub fn is_up(&self) -> bool {
        self.change >= 0.0
    }
}

/// Fetch the latest session and the profile, and build a [`Snapshot`].
pub fn load_snapshot(provider: &dyn DataProvider, symbol: &str) -> Result<Snapshot, PipelineError> {
    let table = provider.history(symbol, &DisplayPeriod::OneDay.request())?;
    let profile = provider.profile(symbol);
    let snapshot = Snapshot::from_table(&table, &profile).ok_or_else(|| {
        PipelineError::UnknownSymbol {
            symbol: symbol.to_string(),
        }
    })?;
    info!(symbol, price = snapshot.current_price, "loaded snapshot");
    Ok(snapshot)
}

/// Fetch the chart history for a display period.
pub fn load_history(
    provider: &dyn DataProvider,
    symbol: &str,
    period: DisplayPeriod,
) -> Result<OhlcvTable, PipelineError> {
    let table = provider.history(symbol, &period.request())?;
    if table.is_empty() {
        return Err(PipelineError::UnknownSymbol {
            symbol: symbol.to_string(),
        });
    }
    info!(symbol, period = %period, bars = table.len(), "loaded history");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pricecast_core::domain::Bar;

    fn session() -> OhlcvTable {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
        let bar = |minutes: i64, open: f64, high: f64, low: f64, close: f64| Bar {
            timestamp: start + chrono::Duration::minutes(minutes),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        };
        OhlcvTable::new(
            "AAPL",
            vec![
                bar(0, 100.0, 101.0, 99.5, 100.5),
                bar(5, 100.5, 103.0, 100.0, 102.0),
                bar(10, 102.0, 102.5, 101.0, 102.0),
            ],
        )
    }

    #[test]
    fn snapshot_uses_first_bar_and_last_close() {
        let profile = SymbolProfile {
            long_name: Some("Apple Inc.".into()),
            currency: Some("USD".into()),
            trailing_pe: Some(28.5),
        };
        let snap = Snapshot::from_table(&session(), &profile).unwrap();
        assert_eq!(snap.current_price, 102.0);
        assert!((snap.change - 2.0).abs() < 1e-12);
        assert!((snap.change_percent - 2.0).abs() < 1e-12);
        assert_eq!((snap.open, snap.high, snap.low), (100.0, 101.0, 99.5));
        assert_eq!(snap.trailing_pe, 28.5);
        assert_eq!(snap.long_name, "Apple Inc.");
        assert!(snap.is_up());
    }

    #[test]
    fn snapshot_falls_back_on_missing_profile() {
        let snap = Snapshot::from_table(&session(), &SymbolProfile::default()).unwrap();
        assert_eq!(snap.long_name, "AAPL");
        assert_eq!(snap.currency, "USD");
        assert_eq!(snap.trailing_pe, 0.0);
    }

    #[test]
    fn empty_table_has_no_snapshot() {
        let empty = OhlcvTable::empty("NOPE");
        assert!(Snapshot::from_table(&empty, &SymbolProfile::default()).is_none());
    }
}
