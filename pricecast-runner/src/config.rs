//! Serializable forecast configuration.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pricecast_core::domain::FEATURE_COUNT;
use pricecast_core::model::{ModelError, NetworkConfig, TrainingConfig};

/// Upper bound on `lookback_days` (about a century).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Errors from loading or validating a [`ForecastConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ModelError> for ConfigError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::InvalidConfig(msg) => ConfigError::Invalid(msg),
            other => ConfigError::Invalid(other.to_string()),
        }
    }
}

/// Every tunable of the forecast pipeline.
///
/// Missing TOML keys take the defaults below, which reproduce the canonical
/// model: 60-bar windows, 15-day horizon, two LSTM layers of width 50,
/// 50 epochs of batch 32 with a 10% validation hold-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Window length fed to the network.
    pub time_steps: usize,
    /// Number of future daily closes predicted.
    pub future_days: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub learning_rate: f64,
    /// Calendar days of history fetched before `now`.
    pub lookback_days: i64,
    /// Weight-init and shuffle seed. A fresh random seed is drawn when absent.
    pub seed: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            time_steps: 60,
            future_days: 15,
            hidden_size: 50,
            num_layers: 2,
            epochs: 50,
            batch_size: 32,
            validation_split: 0.1,
            learning_rate: 0.001,
            lookback_days: 5 * 365,
            seed: None,
        }
    }
}

impl ForecastConfig {
    /// Load from a TOML file and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_steps == 0 {
            return Err(ConfigError::Invalid("time_steps must be at least 1".into()));
        }
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be in 1..={MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        self.network_config().validate()?;
        self.training_config().validate()?;
        Ok(())
    }

    /// Deterministic BLAKE3 hash of this configuration.
    ///
    /// Two forecasts with the same hash, seed and input fingerprint train
    /// identical networks.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Start of the history window `[start, now)`.
    pub fn history_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ConfigError> {
        Duration::try_days(self.lookback_days)
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "lookback_days {} reaches before the earliest representable date",
                    self.lookback_days
                ))
            })
    }

    /// Minimum number of bars needed to build one training window.
    pub fn min_rows(&self) -> usize {
        self.time_steps + self.future_days
    }

    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            input_size: FEATURE_COUNT,
            hidden_size: self.hidden_size,
            num_layers: self.num_layers,
            output_size: self.future_days,
        }
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            epochs: self.epochs,
            batch_size: self.batch_size,
            validation_split: self.validation_split,
            learning_rate: self.learning_rate,
        }
    }
}
