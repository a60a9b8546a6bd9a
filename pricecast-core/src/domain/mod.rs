//! Domain types for PriceCast

pub mod bar;
pub mod forecast;
pub mod table;

pub use bar::{Bar, CLOSE_COLUMN, FEATURE_COUNT, FEATURE_NAMES};
pub use forecast::{Forecast, ForecastPoint};
pub use table::{features_of, OhlcvTable};
