//! Reporting and export: text, CSV, and JSON rendering for the CLI.
//!
//! Provides three output formats for a forecast:
//! - **Table**: human-readable date / price listing
//! - **CSV**: `date,predicted_close` rows for external tools
//! - **JSON**: full report with schema versioning, input fingerprint and
//!   training summary
//!
//! Everything is returned as a `String`; nothing is written to disk.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricecast_core::domain::{Forecast, OhlcvTable};

use crate::config::ForecastConfig;
use crate::dashboard::Snapshot;
use crate::pipeline::{ForecastReport, TrainingSummary};

/// Current schema version for JSON reports.
pub const SCHEMA_VERSION: u32 = 1;

// ─── Text ───────────────────────────────────────────────────────────

/// Render the forecast as an aligned two-column table.
pub fn render_forecast_table(forecast: &Forecast) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {}-day price forecast", forecast.symbol, forecast.len());
    let _ = writeln!(out, "{:<12} {:>14}", "Date", "Predicted");
    let _ = writeln!(out, "{}", "-".repeat(27));
    for point in &forecast.points {
        let _ = writeln!(
            out,
            "{:<12} {:>14.2}",
            point.date.format("%Y-%m-%d"),
            point.predicted_close
        );
    }
    out
}

/// Render the price header and the key-statistics tiles.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let arrow = if snapshot.is_up() { "▲" } else { "▼" };
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", snapshot.long_name, snapshot.symbol);
    let _ = writeln!(
        out,
        "{:.2} {}  {} {:+.2} ({:+.2}%)",
        snapshot.current_price, snapshot.currency, arrow, snapshot.change, snapshot.change_percent
    );
    let _ = writeln!(
        out,
        "Open {:.2} | High {:.2} | Low {:.2} | P/E {:.2}",
        snapshot.open, snapshot.high, snapshot.low, snapshot.trailing_pe
    );
    out
}

/// Render the newest `rows` bars of a table, oldest first.
pub fn render_history(table: &OhlcvTable, rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<17} {:>10} {:>10} {:>10} {:>10} {:>14}",
        "Timestamp", "Open", "High", "Low", "Close", "Volume"
    );
    for bar in table.tail(rows) {
        let _ = writeln!(
            out,
            "{:<17} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>14.0}",
            bar.timestamp.format("%Y-%m-%d %H:%M"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        );
    }
    out
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the forecast as CSV with `date,predicted_close` columns.
pub fn export_forecast_csv(forecast: &Forecast) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "predicted_close"])?;
    for point in &forecast.points {
        wtr.write_record([
            &point.date.format("%Y-%m-%d").to_string(),
            &format!("{:.6}", point.predicted_close),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

/// Persistable summary of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastJson {
    pub schema_version: u32,
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    /// BLAKE3 fingerprint of the table the network was trained on.
    pub input_fingerprint: String,
    pub input_rows: usize,
    pub config_hash: String,
    pub config: ForecastConfig,
    pub training: TrainingSummary,
    pub forecast: Forecast,
}

impl ForecastJson {
    pub fn new(report: &ForecastReport, config: &ForecastConfig) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: report.forecast.symbol.clone(),
            generated_at: report.forecast.generated_at,
            input_fingerprint: report.history.fingerprint(),
            input_rows: report.history.len(),
            config_hash: config.config_hash(),
            config: config.clone(),
            training: report.training.clone(),
            forecast: report.forecast.clone(),
        }
    }
}

/// Serialize a forecast report to pretty JSON.
pub fn export_report_json(report: &ForecastReport, config: &ForecastConfig) -> Result<String> {
    serde_json::to_string_pretty(&ForecastJson::new(report, config))
        .context("failed to serialize forecast report to JSON")
}
