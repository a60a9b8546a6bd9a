//! Named lookback periods, bar intervals, and the history request shape.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named trailing lookback, as understood by the upstream chart API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    SixMonths,
    YearToDate,
    FiveYears,
}

impl Period {
    /// Query-string token (`range=` parameter).
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::SixMonths => "6mo",
            Period::YearToDate => "ytd",
            Period::FiveYears => "5y",
        }
    }

    /// Earliest instant covered when the period ends at `end`.
    ///
    /// Calendar approximation used by offline providers; the upstream API
    /// resolves periods against its own trading calendar.
    pub fn start_before(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::OneDay => end - Duration::days(1),
            Period::FiveDays => end - Duration::days(5),
            Period::OneMonth => end - Duration::days(30),
            Period::SixMonths => end - Duration::days(182),
            Period::YearToDate => Utc
                .with_ymd_and_hms(end.year(), 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(end),
            Period::FiveYears => end - Duration::days(365 * 5),
        }
    }
}

/// Bar spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    FiveMinutes,
    FifteenMinutes,
    Daily,
}

impl Interval {
    /// Query-string token (`interval=` parameter).
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::Daily => "1d",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Interval::FiveMinutes => Duration::minutes(5),
            Interval::FifteenMinutes => Duration::minutes(15),
            Interval::Daily => Duration::days(1),
        }
    }
}

/// What to fetch: an explicit half-open range of daily bars, or a named
/// period at a given interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRequest {
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Period { period: Period, interval: Interval },
}

impl HistoryRequest {
    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        HistoryRequest::Range { start, end }
    }

    pub fn period(period: Period, interval: Interval) -> Self {
        HistoryRequest::Period { period, interval }
    }
}

/// The display periods offered by the dashboard selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayPeriod {
    #[default]
    OneDay,
    FiveDays,
    OneMonth,
    SixMonths,
    YearToDate,
    More,
}

impl DisplayPeriod {
    pub const ALL: [DisplayPeriod; 6] = [
        DisplayPeriod::OneDay,
        DisplayPeriod::FiveDays,
        DisplayPeriod::OneMonth,
        DisplayPeriod::SixMonths,
        DisplayPeriod::YearToDate,
        DisplayPeriod::More,
    ];

    /// The chart request backing this display period.
    pub fn request(&self) -> HistoryRequest {
        match self {
            DisplayPeriod::OneDay => HistoryRequest::period(Period::OneDay, Interval::FiveMinutes),
            DisplayPeriod::FiveDays => {
                HistoryRequest::period(Period::FiveDays, Interval::FifteenMinutes)
            }
            DisplayPeriod::OneMonth => HistoryRequest::period(Period::OneMonth, Interval::Daily),
            DisplayPeriod::SixMonths => HistoryRequest::period(Period::SixMonths, Interval::Daily),
            // "More" has no longer view of its own and shares the YTD chart.
            DisplayPeriod::YearToDate | DisplayPeriod::More => {
                HistoryRequest::period(Period::YearToDate, Interval::Daily)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayPeriod::OneDay => "1D",
            DisplayPeriod::FiveDays => "5D",
            DisplayPeriod::OneMonth => "1M",
            DisplayPeriod::SixMonths => "6M",
            DisplayPeriod::YearToDate => "YTD",
            DisplayPeriod::More => "More",
        }
    }
}

impl fmt::Display for DisplayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DisplayPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayPeriod::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let labels: Vec<&str> = DisplayPeriod::ALL.iter().map(|p| p.label()).collect();
                format!("unknown period '{s}' (expected one of {})", labels.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_periods_map_to_chart_requests() {
        assert_eq!(
            DisplayPeriod::OneDay.request(),
            HistoryRequest::period(Period::OneDay, Interval::FiveMinutes)
        );
        assert_eq!(
            DisplayPeriod::FiveDays.request(),
            HistoryRequest::period(Period::FiveDays, Interval::FifteenMinutes)
        );
        assert_eq!(
            DisplayPeriod::SixMonths.request(),
            HistoryRequest::period(Period::SixMonths, Interval::Daily)
        );
        assert_eq!(DisplayPeriod::More.request(), DisplayPeriod::YearToDate.request());
    }

    #[test]
    fn display_period_parses_case_insensitively() {
        assert_eq!("ytd".parse::<DisplayPeriod>().unwrap(), DisplayPeriod::YearToDate);
        assert_eq!("1m".parse::<DisplayPeriod>().unwrap(), DisplayPeriod::OneMonth);
        assert!("2W".parse::<DisplayPeriod>().is_err());
    }

    #[test]
    fn ytd_starts_on_january_first() {
        let end = Utc.with_ymd_and_hms(2024, 8, 15, 12, 0, 0).unwrap();
        let start = Period::YearToDate.start_before(end);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn tokens_match_chart_api() {
        assert_eq!(Period::FiveYears.as_str(), "5y");
        assert_eq!(Interval::FifteenMinutes.as_str(), "15m");
    }
}
