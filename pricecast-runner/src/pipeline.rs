//! Forecast pipeline: acquire, normalize, window, train, predict, invert.
//!
//! Two entry points:
//! - `run_forecast()`: fetches `[now - lookback_days, now)` from a provider,
//!   then forecasts. Used by the CLI.
//! - `forecast_table()`: forecasts an already loaded table.
//!
//! Every call fits a fresh scaler and trains a fresh network; nothing is
//! cached between calls.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use pricecast_core::data::{DataError, DataProvider};
use pricecast_core::domain::{features_of, Forecast, OhlcvTable, CLOSE_COLUMN};
use pricecast_core::model::{ForecastNetwork, ModelError, TrainingHistory};
use pricecast_core::preprocess::{build_windows, MinMaxScaler, ScalerError, WindowError};

use crate::config::{ConfigError, ForecastConfig};
use crate::dashboard::COMMON_SYMBOLS;

/// Failures from scaling, windowing or the network.
#[derive(Debug, Error)]
pub enum NumericalError {
    #[error(transparent)]
    Scaler(#[from] ScalerError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors from the forecast pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "no data found for '{symbol}'. Check the symbol and try again; common symbols: {}",
        COMMON_SYMBOLS.join(", ")
    )]
    UnknownSymbol { symbol: String },

    #[error("not enough history to forecast: {rows} bars, need at least {required}")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("numerical error: {0}")]
    Numerical(#[from] NumericalError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ScalerError> for PipelineError {
    fn from(e: ScalerError) -> Self {
        PipelineError::Numerical(e.into())
    }
}

impl From<WindowError> for PipelineError {
    fn from(e: WindowError) -> Self {
        PipelineError::Numerical(e.into())
    }
}

impl From<ModelError> for PipelineError {
    fn from(e: ModelError) -> Self {
        PipelineError::Numerical(e.into())
    }
}

/// How the network was trained for one forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub seed: u64,
    pub rows: usize,
    pub windows: usize,
    pub epochs: usize,
    pub last_close: f64,
    pub scaler: MinMaxScaler,
    pub history: TrainingHistory,
}

/// Everything `run_forecast` produced.
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub history: OhlcvTable,
    pub forecast: Forecast,
    pub training: TrainingSummary,
}

/// Fetch history for `symbol` and forecast its next `future_days` closes.
///
/// An empty fetch is reported as [`PipelineError::UnknownSymbol`] before any
/// preprocessing happens.
pub fn run_forecast(
    provider: &dyn DataProvider,
    symbol: &str,
    config: &ForecastConfig,
    now: DateTime<Utc>,
) -> Result<ForecastReport, PipelineError> {
    config.validate()?;
    let start = config.history_start(now)?;

    info!(symbol, provider = provider.name(), %start, %now, "fetching history");
    let history = provider.fetch(symbol, start, now)?;
    if history.is_empty() {
        return Err(PipelineError::UnknownSymbol {
            symbol: symbol.to_string(),
        });
    }

    let (forecast, training) = forecast_table(&history, config, now)?;
    Ok(ForecastReport {
        history,
        forecast,
        training,
    })
}

/// Forecast from an already loaded table.
///
/// The one scaler fitted on the whole table normalizes the training windows,
/// the prediction input and the inverse transform of the output.
pub fn forecast_table(
    table: &OhlcvTable,
    config: &ForecastConfig,
    now: DateTime<Utc>,
) -> Result<(Forecast, TrainingSummary), PipelineError> {
    config.validate()?;
    let symbol = table.symbol();
    let last_close = match table.last() {
        Some(bar) => bar.close,
        None => {
            return Err(PipelineError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
        }
    };

    let rows = table.len();
    let required = config.min_rows();
    if rows < required {
        return Err(PipelineError::InsufficientHistory { rows, required });
    }

    // Step 1: normalize all five columns jointly over the full table.
    let raw = table.feature_matrix();
    let scaler = MinMaxScaler::fit(raw.view())?;
    let scaled = scaler.transform(raw.view())?;

    // Step 2: supervised windows over the normalized close.
    let dataset = build_windows(
        scaled.view(),
        config.time_steps,
        config.future_days,
        CLOSE_COLUMN,
    )?;

    // Step 3: train.
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut network = ForecastNetwork::new(config.network_config(), &mut rng)?;

    info!(
        symbol,
        rows,
        windows = dataset.len(),
        epochs = config.epochs,
        seed,
        "training forecast network"
    );
    let history = network.fit(&dataset, &config.training_config(), &mut rng)?;
    info!(
        symbol,
        loss = history.final_loss(),
        val_loss = history.final_val_loss(),
        "training complete"
    );

    // Step 4: predict from the most recent raw rows, scaled the same way.
    let recent = features_of(table.tail(config.time_steps));
    let window = scaler.transform(recent.view())?;
    let scaled_closes = network.predict_one(window.view())?;

    // Step 5: back to price units.
    let prices = scaler.inverse_column(CLOSE_COLUMN, &scaled_closes.to_vec())?;
    if prices.iter().any(|p| !p.is_finite()) {
        return Err(ModelError::NonFinitePrediction.into());
    }

    // Step 6: one point per calendar day from `now`.
    let forecast = Forecast::daily(symbol, now, &prices);
    info!(symbol, points = forecast.len(), "forecast ready");

    let training = TrainingSummary {
        seed,
        rows,
        windows: dataset.len(),
        epochs: config.epochs,
        last_close,
        scaler,
        history,
    };
    Ok((forecast, training))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pricecast_core::data::SyntheticProvider;
    use pricecast_core::domain::Bar;

    fn tiny_config() -> ForecastConfig {
        ForecastConfig {
            time_steps: 5,
            future_days: 3,
            hidden_size: 4,
            num_layers: 2,
            epochs: 2,
            batch_size: 8,
            seed: Some(1),
            ..ForecastConfig::default()
        }
    }

    fn table(rows: usize) -> OhlcvTable {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        let bars = (0..rows)
            .map(|i| {
                let close = 50.0 + (i as f64 * 0.3).sin() * 5.0;
                Bar {
                    timestamp: start + Duration::days(i as i64),
                    open: close - 0.2,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 10_000.0 + i as f64,
                }
            })
            .collect();
        OhlcvTable::new("TEST", bars)
    }

    #[test]
    fn one_short_of_minimum_fails_before_training() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = forecast_table(&table(7), &tiny_config(), now).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientHistory { rows: 7, required: 8 }
        ));
    }

    #[test]
    fn exact_minimum_yields_a_forecast() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let (forecast, training) = forecast_table(&table(8), &tiny_config(), now).unwrap();
        assert_eq!(training.windows, 1);
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast.points[0].date, now);
    }

    #[test]
    fn empty_table_is_unknown_symbol() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = forecast_table(&OhlcvTable::empty("ZZZZ"), &tiny_config(), now).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownSymbol { .. }));
        assert!(err.to_string().contains("AAPL"));
    }

    #[test]
    fn same_seed_same_forecast() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let (a, _) = forecast_table(&table(40), &tiny_config(), now).unwrap();
        let (b, _) = forecast_table(&table(40), &tiny_config(), now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_lookback_is_a_config_error() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let config = ForecastConfig {
            lookback_days: 100_000_000,
            ..tiny_config()
        };
        let provider = SyntheticProvider::new(now);
        assert!(matches!(
            run_forecast(&provider, "AAPL", &config, now),
            Err(PipelineError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let config = ForecastConfig {
            num_layers: 0,
            ..tiny_config()
        };
        assert!(matches!(
            forecast_table(&table(40), &config, now),
            Err(PipelineError::Config(_))
        ));
    }
}
