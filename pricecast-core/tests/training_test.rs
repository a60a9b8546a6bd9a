//! End-to-end preprocessing and training on synthetic market data.

use chrono::{TimeZone, Utc};
use pricecast_core::data::{DataProvider, SyntheticProvider};
use pricecast_core::domain::{CLOSE_COLUMN, FEATURE_COUNT};
use pricecast_core::model::{ForecastNetwork, NetworkConfig, TrainingConfig};
use pricecast_core::preprocess::{build_windows, MinMaxScaler};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn synthetic_history_trains_and_predicts_in_price_units() {
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
    let provider = SyntheticProvider::new(now);
    let table = provider
        .fetch("AAPL", now - chrono::Duration::days(365), now)
        .unwrap();
    assert!(table.len() > 200, "expected a year of weekdays, got {}", table.len());

    let raw = table.feature_matrix();
    let scaler = MinMaxScaler::fit(raw.view()).unwrap();
    let scaled = scaler.transform(raw.view()).unwrap();

    let (time_steps, future_days) = (20, 5);
    let ds = build_windows(scaled.view(), time_steps, future_days, CLOSE_COLUMN).unwrap();
    assert_eq!(ds.len(), table.len() - time_steps - future_days + 1);

    let mut rng = StdRng::seed_from_u64(7);
    let mut net = ForecastNetwork::new(
        NetworkConfig {
            input_size: FEATURE_COUNT,
            hidden_size: 8,
            num_layers: 2,
            output_size: future_days,
        },
        &mut rng,
    )
    .unwrap();
    let history = net
        .fit(
            &ds,
            &TrainingConfig {
                epochs: 3,
                batch_size: 32,
                validation_split: 0.1,
                learning_rate: 0.005,
            },
            &mut rng,
        )
        .unwrap();
    assert_eq!(history.loss.len(), 3);
    assert!(history.loss.iter().all(|l| l.is_finite()));

    let last_rows = raw.slice(ndarray::s![raw.nrows() - time_steps.., ..]);
    let window = scaler.transform(last_rows).unwrap();
    let scaled_prediction = net.predict_one(window.view()).unwrap();
    let prices = scaler
        .inverse_column(CLOSE_COLUMN, scaled_prediction.as_slice().unwrap())
        .unwrap();

    assert_eq!(prices.len(), future_days);
    let lo = scaler.data_min()[CLOSE_COLUMN];
    let hi = scaler.data_max()[CLOSE_COLUMN];
    let span = hi - lo;
    for p in prices {
        assert!(p > lo - span && p < hi + span, "{p} far outside [{lo}, {hi}]");
    }
}
