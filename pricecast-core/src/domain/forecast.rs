//! Forecast result: predicted closes paired with calendar dates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One projected close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: DateTime<Utc>,
    pub predicted_close: f64,
}

/// Forward price projection for one symbol.
///
/// Dates start at `generated_at` and step one calendar day at a time; they
/// are not trading-day aware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    /// Pair each price with `start + i days`.
    pub fn daily(symbol: impl Into<String>, start: DateTime<Utc>, prices: &[f64]) -> Self {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &predicted_close)| ForecastPoint {
                date: start + Duration::days(i as i64),
                predicted_close,
            })
            .collect();
        Self {
            symbol: symbol.into(),
            generated_at: start,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dates_start_now_and_step_daily() {
        let now = Utc.with_ymd_and_hms(2024, 6, 28, 17, 5, 0).unwrap();
        let f = Forecast::daily("AAPL", now, &[1.0, 2.0, 3.0]);
        assert_eq!(f.len(), 3);
        assert_eq!(f.points[0].date, now);
        assert_eq!(f.points[2].date, now + Duration::days(2));
        // Weekends are not skipped.
        assert_eq!(f.points[1].date.date_naive().to_string(), "2024-06-29");
        assert_eq!(f.prices(), vec![1.0, 2.0, 3.0]);
    }
}
