//! Synthetic bar provider for development and tests.
//!
//! Produces a random walk from a starting price of 100.0, weekdays only,
//! seeded from the BLAKE3 hash of the symbol so the same symbol and request
//! always produce the same bars.

use super::period::{HistoryRequest, Interval};
use super::provider::{validate_request, DataError, DataProvider, DataSource, SymbolProfile};
use crate::domain::{Bar, OhlcvTable};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Regular session in UTC (09:30–16:00 New York, ignoring DST).
const SESSION_OPEN: (u32, u32) = (14, 30);
const SESSION_MINUTES: i64 = 390;
const START_PRICE: f64 = 100.0;

/// Deterministic random-walk provider.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    as_of: DateTime<Utc>,
}

impl SyntheticProvider {
    /// `as_of` anchors named periods ("the last 5 days" ends here).
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self { as_of }
    }

    /// Generate bars with `start <= timestamp < end`.
    pub fn generate(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Vec<Bar> {
        let seed_bytes = blake3::hash(symbol.as_bytes());
        let seed: [u8; 32] = *seed_bytes.as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let (hour, minute) = SESSION_OPEN;
        let session_open = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
        let step = interval.duration();
        // Intraday bars share the daily move across the session.
        let steps_per_day = match interval {
            Interval::Daily => 1,
            _ => (SESSION_MINUTES / step.num_minutes()).max(1),
        };
        let max_move = 0.03 / (steps_per_day as f64).sqrt();

        let mut bars = Vec::new();
        let mut price = START_PRICE;
        let mut day = start.date_naive();

        while day <= end.date_naive() {
            if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                day += Duration::days(1);
                continue;
            }

            let open_at = day.and_time(session_open).and_utc();
            for k in 0..steps_per_day {
                let timestamp = open_at + step * k as i32;
                let ret: f64 = rng.gen_range(-max_move..max_move);
                let open = price;
                let close = price * (1.0 + ret);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
                let volume = rng.gen_range(500_000..5_000_000u64) as f64 / steps_per_day as f64;
                price = close;

                if timestamp >= start && timestamp < end {
                    bars.push(Bar {
                        timestamp,
                        open,
                        high,
                        low,
                        close,
                        volume,
                    });
                }
            }
            day += Duration::days(1);
        }

        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn history(&self, symbol: &str, request: &HistoryRequest) -> Result<OhlcvTable, DataError> {
        validate_request(symbol, request)?;
        let bars = match request {
            HistoryRequest::Range { start, end } => {
                self.generate(symbol, *start, *end, Interval::Daily)
            }
            HistoryRequest::Period { period, interval } => {
                self.generate(symbol, period.start_before(self.as_of), self.as_of, *interval)
            }
        };
        debug!(symbol, bars = bars.len(), "generated synthetic bars");
        Ok(OhlcvTable::new(symbol, bars))
    }

    fn profile(&self, symbol: &str) -> SymbolProfile {
        SymbolProfile {
            long_name: Some(format!("{symbol} (synthetic)")),
            currency: Some("USD".into()),
            trailing_pe: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::period::Period;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 28, 21, 0, 0).unwrap()
    }

    #[test]
    fn same_symbol_same_bars() {
        let p = SyntheticProvider::new(as_of());
        let start = as_of() - Duration::days(60);
        let a = p.fetch("SPY", start, as_of()).unwrap();
        let b = p.fetch("SPY", start, as_of()).unwrap();
        let c = p.fetch("QQQ", start, as_of()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.closes(), c.closes());
    }

    #[test]
    fn skips_weekends_and_stays_sane() {
        let p = SyntheticProvider::new(as_of());
        let table = p.fetch("SPY", as_of() - Duration::days(28), as_of()).unwrap();
        assert_eq!(table.len(), 20);
        for bar in table.bars() {
            assert!(!matches!(bar.timestamp.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(bar.is_sane(), "insane bar: {bar:?}");
        }
    }

    #[test]
    fn intraday_period_uses_interval_spacing() {
        let p = SyntheticProvider::new(as_of());
        let table = p
            .history("SPY", &HistoryRequest::period(Period::OneDay, Interval::FiveMinutes))
            .unwrap();
        assert_eq!(table.len(), 78);
        let gap = table.bars()[1].timestamp - table.bars()[0].timestamp;
        assert_eq!(gap, Duration::minutes(5));
    }
}
