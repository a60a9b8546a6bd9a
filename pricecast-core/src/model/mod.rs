//! Recurrent forecasting network, trained from scratch with ndarray.
//!
//! The network maps a `time_steps × features` window to `output_size`
//! future values through stacked LSTM layers and a linear head.

pub mod dense;
pub mod init;
pub mod lstm;
pub mod network;
pub mod optimizer;

pub use dense::{Dense, DenseGradients};
pub use lstm::{LstmCache, LstmGradients, LstmLayer};
pub use network::{ForecastNetwork, ModelError, NetworkConfig, TrainingConfig, TrainingHistory};
pub use optimizer::{Adam, Parameter};
