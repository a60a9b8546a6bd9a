//! Normalization and windowing of feature matrices

pub mod scaler;
pub mod window;

pub use scaler::{MinMaxScaler, ScalerError};
pub use window::{build_windows, window_count, WindowError, WindowedDataset};
