//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, file
//! import, synthetic bars) so we can swap implementations and mock for tests.

use super::period::HistoryRequest;
use crate::domain::OhlcvTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
///
/// An unknown symbol is *not* an error: providers return an empty table and
/// the caller decides what to tell the user.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("import error: {0}")]
    Import(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    FileImport,
    Synthetic,
}

/// Descriptive fields shown next to a symbol. Every field is optional; a
/// provider that cannot supply one leaves it empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolProfile {
    pub long_name: Option<String>,
    pub currency: Option<String>,
    pub trailing_pe: Option<f64>,
}

/// Trait for market data providers.
///
/// Implementations are blocking and single-shot: no caching, no retries.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch bars for a symbol. Returns an empty table when the symbol is
    /// unknown or has no data for the request.
    fn history(&self, symbol: &str, request: &HistoryRequest) -> Result<OhlcvTable, DataError>;

    /// Fetch daily bars with `start <= timestamp < end`.
    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<OhlcvTable, DataError> {
        let request = HistoryRequest::range(start, end);
        validate_request(symbol, &request)?;
        self.history(symbol, &request)
    }

    /// Best-effort descriptive fields. Never fails.
    fn profile(&self, _symbol: &str) -> SymbolProfile {
        SymbolProfile::default()
    }
}

/// Reject an empty symbol or an inverted range.
pub fn validate_request(symbol: &str, request: &HistoryRequest) -> Result<(), DataError> {
    if symbol.trim().is_empty() {
        return Err(DataError::InvalidRequest("symbol must not be empty".into()));
    }
    if let HistoryRequest::Range { start, end } = request {
        if end < start {
            return Err(DataError::InvalidRequest(format!(
                "end {end} is before start {start}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn empty_symbol_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let err = validate_request("  ", &HistoryRequest::range(now, now)).unwrap_err();
        assert!(matches!(err, DataError::InvalidRequest(_)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let req = HistoryRequest::range(now, now - Duration::days(1));
        assert!(validate_request("SPY", &req).is_err());
        assert!(validate_request("SPY", &HistoryRequest::range(now, now)).is_ok());
    }
}
