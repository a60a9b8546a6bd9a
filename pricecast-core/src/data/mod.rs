//! Market data acquisition

pub mod file;
pub mod period;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use file::FileProvider;
pub use period::{DisplayPeriod, HistoryRequest, Interval, Period};
pub use provider::{validate_request, DataError, DataProvider, DataSource, SymbolProfile};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
