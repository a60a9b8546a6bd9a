//! PriceCast Runner: forecast orchestration, configuration, dashboard figures, export.
//!
//! This crate builds on `pricecast-core` to provide:
//! - `ForecastConfig` with TOML loading and validation
//! - The forecast pipeline (fetch, scale, window, train, predict, invert)
//! - Dashboard snapshot and display-period history loading
//! - Text, CSV and JSON rendering of forecasts

pub mod config;
pub mod dashboard;
pub mod export;
pub mod pipeline;

pub use config::{ConfigError, ForecastConfig};
pub use dashboard::{load_history, load_snapshot, Snapshot, COMMON_SYMBOLS};
pub use export::{
    export_forecast_csv, export_report_json, render_forecast_table, render_history,
    render_snapshot, ForecastJson, SCHEMA_VERSION,
};
pub use pipeline::{
    forecast_table, run_forecast, ForecastReport, NumericalError, PipelineError, TrainingSummary,
};
