//! Yahoo Finance data provider.
//!
//! Fetches OHLCV bars from Yahoo's v8 chart API, either for an explicit
//! range (`period1`/`period2`) or a named range/interval pair. A single
//! request per call: no retries, no backoff.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! File import is the fallback when Yahoo is unavailable.

use super::period::{HistoryRequest, Interval, Period};
use super::provider::{validate_request, DataError, DataProvider, DataSource, SymbolProfile};
use crate::domain::{Bar, OhlcvTable};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// v7 quote endpoint response; only the trailing P/E is read from it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    quote_response: QuoteResult,
}

#[derive(Debug, Deserialize)]
struct QuoteResult {
    #[serde(default)]
    result: Vec<QuoteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEntry {
    trailing_pe: Option<f64>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at a different host (mirrors, test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `base_url` joined with `segments`, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DataError> {
        let base = &self.base_url;
        let mut url = Url::parse(base)
            .map_err(|e| DataError::Network(format!("invalid base URL {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DataError::Network(format!("base URL {base} cannot take a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build the chart API URL for a symbol and request.
    fn chart_url(&self, symbol: &str, request: &HistoryRequest) -> Result<Url, DataError> {
        let mut url = self.endpoint(&["v8", "finance", "chart", symbol])?;
        {
            let mut query = url.query_pairs_mut();
            match request {
                HistoryRequest::Range { start, end } => {
                    query
                        .append_pair("period1", &start.timestamp().to_string())
                        .append_pair("period2", &end.timestamp().to_string())
                        .append_pair("interval", "1d");
                }
                HistoryRequest::Period { period, interval } => {
                    query
                        .append_pair("range", period.as_str())
                        .append_pair("interval", interval.as_str());
                }
            }
        }
        Ok(url)
    }

    fn quote_url(&self, symbol: &str) -> Result<Url, DataError> {
        let mut url = self.endpoint(&["v7", "finance", "quote"])?;
        url.query_pairs_mut().append_pair("symbols", symbol);
        Ok(url)
    }

    /// GET a chart and decode the body. 404 bodies still carry a chart
    /// envelope (with a "Not Found" error) so they are decoded too.
    fn get_chart(&self, url: Url, symbol: &str) -> Result<ChartResponse, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::Network(format!("HTTP {status} for {symbol}")));
        }

        resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })
    }

    fn fetch_profile(&self, symbol: &str) -> Result<SymbolProfile, DataError> {
        let url = self.chart_url(
            symbol,
            &HistoryRequest::period(Period::OneDay, Interval::Daily),
        )?;
        let chart = self.get_chart(url, symbol)?;
        let meta = chart
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .and_then(|d| d.meta);

        let mut profile = SymbolProfile::default();
        if let Some(meta) = meta {
            profile.long_name = meta.long_name.or(meta.short_name);
            profile.currency = meta.currency;
        }

        match self.fetch_trailing_pe(symbol) {
            Ok(pe) => profile.trailing_pe = pe,
            Err(e) => debug!(symbol, error = %e, "trailing P/E unavailable"),
        }
        Ok(profile)
    }

    fn fetch_trailing_pe(&self, symbol: &str) -> Result<Option<f64>, DataError> {
        let resp = self
            .client
            .get(self.quote_url(symbol)?)
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(DataError::Network(format!("HTTP {} for quote", resp.status())));
        }
        let quote: QuoteResponse = resp
            .json()
            .map_err(|e| DataError::ResponseFormatChanged(e.to_string()))?;
        Ok(quote
            .quote_response
            .result
            .into_iter()
            .next()
            .and_then(|q| q.trailing_pe))
    }
}

/// Parse the chart API response into a table.
///
/// "Not Found" and empty results become an empty table. Bars with any missing
/// OHLCV field are dropped. For range requests, bars outside `[start, end)`
/// are dropped too.
fn parse_response(
    symbol: &str,
    resp: ChartResponse,
    request: &HistoryRequest,
) -> Result<OhlcvTable, DataError> {
    let results = match resp.chart.result {
        Some(results) => results,
        None => {
            return match resp.chart.error {
                Some(err) if err.code == "Not Found" => {
                    debug!(symbol, description = %err.description, "symbol not found");
                    Ok(OhlcvTable::empty(symbol))
                }
                Some(err) => Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                ))),
                None => Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                )),
            };
        }
    };

    let Some(data) = results.into_iter().next() else {
        return Ok(OhlcvTable::empty(symbol));
    };

    // A known symbol with nothing in range comes back without timestamps.
    let Some(timestamps) = data.timestamp else {
        return Ok(OhlcvTable::empty(symbol));
    };

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut dropped = 0usize;

    for (i, &ts) in timestamps.iter().enumerate() {
        let timestamp = DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
        })?;

        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
            value_at(&quote.volume, i),
        ) else {
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
        warn!(symbol, dropped, "dropped bars with missing OHLCV fields");
    }

    let table = OhlcvTable::new(symbol, bars);
    Ok(match request {
        HistoryRequest::Range { start, end } => table.within(*start, *end),
        HistoryRequest::Period { .. } => table,
    })
}

fn value_at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn history(&self, symbol: &str, request: &HistoryRequest) -> Result<OhlcvTable, DataError> {
        validate_request(symbol, request)?;
        let url = self.chart_url(symbol, request)?;
        debug!(%url, "requesting chart");

        let chart = self.get_chart(url, symbol)?;
        let table = parse_response(symbol, chart, request)?;
        info!(symbol, bars = table.len(), "fetched history from Yahoo Finance");
        Ok(table)
    }

    fn profile(&self, symbol: &str) -> SymbolProfile {
        self.fetch_profile(symbol).unwrap_or_else(|e| {
            warn!(symbol, error = %e, "symbol profile unavailable");
            SymbolProfile::default()
        })
    }
}
