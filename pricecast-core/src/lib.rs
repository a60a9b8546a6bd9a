//! PriceCast Core: market data, preprocessing and the LSTM price forecaster.
//!
//! This crate contains:
//! - Domain types (bars, OHLCV tables, forecasts)
//! - Data providers (Yahoo Finance, CSV/Parquet files, synthetic)
//! - Min-max scaling and sliding-window dataset construction
//! - A stacked LSTM network trained with Adam on MSE

pub mod data;
pub mod domain;
pub mod model;
pub mod preprocess;
