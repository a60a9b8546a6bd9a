//! Property tests for forecast output shape.
//!
//! Uses proptest to verify, for any table long enough to window:
//! 1. The forecast has exactly `future_days` points
//! 2. Dates start at the call time and step one day at a time
//! 3. Tables one row short fail before training

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use pricecast_core::domain::{Bar, OhlcvTable};
use pricecast_runner::{forecast_table, ForecastConfig, PipelineError};

fn table(rows: usize, phase: f64) -> OhlcvTable {
    let start = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
    let bars = (0..rows)
        .map(|i| {
            let close = 20.0 + (i as f64 * 0.4 + phase).sin() * 2.0;
            Bar {
                timestamp: start + Duration::days(i as i64),
                open: close - 0.1,
                high: close + 0.3,
                low: close - 0.3,
                close,
                volume: 500.0 + i as f64,
            }
        })
        .collect();
    OhlcvTable::new("PROP", bars)
}

fn tiny_config(time_steps: usize, future_days: usize) -> ForecastConfig {
    ForecastConfig {
        time_steps,
        future_days,
        hidden_size: 3,
        num_layers: 2,
        epochs: 1,
        batch_size: 16,
        seed: Some(5),
        ..ForecastConfig::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn forecast_has_one_point_per_future_day(
        time_steps in 1usize..12,
        future_days in 1usize..8,
        extra in 0usize..20,
        phase in 0.0..6.0_f64,
    ) {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap();
        let config = tiny_config(time_steps, future_days);
        let rows = time_steps + future_days + extra;

        let (forecast, training) = forecast_table(&table(rows, phase), &config, now).unwrap();
        prop_assert_eq!(forecast.len(), future_days);
        prop_assert_eq!(training.windows, extra + 1);
        prop_assert_eq!(forecast.points[0].date, now);
        for (i, point) in forecast.points.iter().enumerate() {
            prop_assert_eq!(point.date, now + Duration::days(i as i64));
            prop_assert!(point.predicted_close.is_finite());
        }
    }

    #[test]
    fn one_row_short_never_trains(
        time_steps in 1usize..30,
        future_days in 1usize..15,
    ) {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap();
        let required = time_steps + future_days;
        let result = forecast_table(&table(required - 1, 0.0), &tiny_config(time_steps, future_days), now);
        let is_insufficient = matches!(
            result,
            Err(PipelineError::InsufficientHistory { rows, required: r }) if rows == required - 1 && r == required
        );
        prop_assert!(is_insufficient);
    }
}
