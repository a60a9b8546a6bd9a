//! Stacked LSTM regressor: `num_layers` LSTM layers followed by a linear
//! head over the final hidden state.

use super::dense::Dense;
use super::lstm::{LstmCache, LstmLayer};
use super::optimizer::Adam;
use crate::preprocess::WindowedDataset;
use ndarray::{s, Array1, Array2, ArrayView2, ArrayView3, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("invalid network configuration: {0}")]
    InvalidConfig(String),

    #[error("input shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("no training windows left after the validation split")]
    NoTrainingData,

    #[error("training diverged at epoch {epoch} (loss is not finite)")]
    Diverged { epoch: usize },

    #[error("network produced a non-finite prediction")]
    NonFinitePrediction,
}

/// Layer sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub output_size: usize,
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [
            ("input_size", self.input_size),
            ("hidden_size", self.hidden_size),
            ("num_layers", self.num_layers),
            ("output_size", self.output_size),
        ] {
            if value == 0 {
                return Err(ModelError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

/// Optimisation settings for [`ForecastNetwork::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of windows (taken from the end, in time order) held out.
    pub validation_split: f64,
    pub learning_rate: f64,
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.epochs == 0 {
            return Err(ModelError::InvalidConfig("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ModelError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ModelError::InvalidConfig(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Number of windows held out for validation out of `total`.
    ///
    /// Training keeps `floor(total * (1 - split))` windows and the rest
    /// validate. When that leaves nothing to train on, nothing is held out.
    pub fn validation_count(&self, total: usize) -> usize {
        let train = (total as f64 * (1.0 - self.validation_split)).floor() as usize;
        if train == 0 {
            0
        } else {
            total - train.min(total)
        }
    }
}

/// Per-epoch losses recorded by [`ForecastNetwork::fit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f64>,
    /// Empty when no windows were held out.
    pub val_loss: Vec<f64>,
    pub train_windows: usize,
    pub validation_windows: usize,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss.last().copied()
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.val_loss.last().copied()
    }
}

#[derive(Debug, Clone)]
pub struct ForecastNetwork {
    config: NetworkConfig,
    layers: Vec<LstmLayer>,
    head: Dense,
}

struct ForwardPass {
    caches: Vec<LstmCache>,
    last_hidden: Array2<f64>,
    output: Array2<f64>,
}

impl ForecastNetwork {
    pub fn new<R: Rng + ?Sized>(config: NetworkConfig, rng: &mut R) -> Result<Self, ModelError> {
        config.validate()?;
        let layers = (0..config.num_layers)
            .map(|l| {
                let input = if l == 0 { config.input_size } else { config.hidden_size };
                LstmLayer::new(input, config.hidden_size, rng)
            })
            .collect();
        let head = Dense::new(config.hidden_size, config.output_size, rng);
        Ok(Self {
            config,
            layers,
            head,
        })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn check_input(&self, x: &ArrayView3<'_, f64>) -> Result<(), ModelError> {
        let (_, steps, features) = x.dim();
        if steps == 0 || features != self.config.input_size {
            return Err(ModelError::ShapeMismatch {
                expected: format!("[batch, >=1, {}]", self.config.input_size),
                actual: format!("{:?}", x.shape()),
            });
        }
        Ok(())
    }

    fn forward(&self, x: ArrayView3<'_, f64>) -> ForwardPass {
        let mut sequence: Vec<Array2<f64>> = (0..x.shape()[1])
            .map(|t| x.slice(s![.., t, ..]).to_owned())
            .collect();

        let mut caches = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let (outputs, cache) = layer.forward(&sequence);
            caches.push(cache);
            sequence = outputs;
        }

        let last_hidden = sequence
            .pop()
            .unwrap_or_else(|| Array2::zeros((x.shape()[0], self.config.hidden_size)));
        let output = self.head.forward(&last_hidden);
        ForwardPass {
            caches,
            last_hidden,
            output,
        }
    }

    /// Predict a batch of windows shaped `[batch, time_steps, input_size]`.
    pub fn predict(&self, x: ArrayView3<'_, f64>) -> Result<Array2<f64>, ModelError> {
        self.check_input(&x)?;
        let output = self.forward(x).output;
        if output.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinitePrediction);
        }
        Ok(output)
    }

    /// Predict from a single `time_steps × input_size` window.
    pub fn predict_one(&self, window: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let batch = window.insert_axis(Axis(0));
        let output = self.predict(batch)?;
        Ok(output.row(0).to_owned())
    }

    /// Mean squared error over every output of every window.
    pub fn evaluate(&self, data: &WindowedDataset) -> Result<f64, ModelError> {
        let predicted = self.predict(data.x.view())?;
        Ok(mse(&predicted, &data.y))
    }

    /// Train on `data` with Adam and MSE loss.
    ///
    /// The last `validation_split` fraction of windows is held out and only
    /// scored. Training windows are reshuffled every epoch.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        data: &WindowedDataset,
        config: &TrainingConfig,
        rng: &mut R,
    ) -> Result<TrainingHistory, ModelError> {
        config.validate()?;
        self.check_input(&data.x.view())?;
        if data.horizon() != self.config.output_size {
            return Err(ModelError::ShapeMismatch {
                expected: format!("targets with {} columns", self.config.output_size),
                actual: format!("{} columns", data.horizon()),
            });
        }

        let n_val = config.validation_count(data.len());
        let (train, validation) = data.split_at(data.len() - n_val);
        if train.is_empty() {
            return Err(ModelError::NoTrainingData);
        }

        let mut history = TrainingHistory {
            train_windows: train.len(),
            validation_windows: validation.len(),
            ..TrainingHistory::default()
        };
        let mut adam = Adam::new(config.learning_rate);
        let mut order: Vec<usize> = (0..train.len()).collect();

        for epoch in 1..=config.epochs {
            order.shuffle(rng);
            let mut weighted_loss = 0.0;

            for batch in order.chunks(config.batch_size) {
                let x = train.x.select(Axis(0), batch);
                let y = train.y.select(Axis(0), batch);
                let loss = self.train_batch(x.view(), &y, &mut adam);
                weighted_loss += loss * batch.len() as f64;
            }

            let loss = weighted_loss / train.len() as f64;
            if !loss.is_finite() {
                return Err(ModelError::Diverged { epoch });
            }
            history.loss.push(loss);

            if validation.is_empty() {
                debug!(epoch, loss, "epoch complete");
            } else {
                let val_loss = self
                    .evaluate(&validation)
                    .map_err(|_| ModelError::Diverged { epoch })?;
                history.val_loss.push(val_loss);
                debug!(epoch, loss, val_loss, "epoch complete");
            }
        }

        Ok(history)
    }

    /// One forward/backward pass and Adam step. Returns the batch loss.
    fn train_batch(&mut self, x: ArrayView3<'_, f64>, y: &Array2<f64>, adam: &mut Adam) -> f64 {
        let pass = self.forward(x);
        let loss = mse(&pass.output, y);

        let scale = 2.0 / pass.output.len() as f64;
        let d_output = (&pass.output - y) * scale;
        let (head_grads, d_last) = self.head.backward(&pass.last_hidden, &d_output);

        let steps = x.shape()[1];
        let mut d_hidden: Vec<Array2<f64>> = vec![Array2::zeros(d_last.raw_dim()); steps];
        d_hidden[steps - 1] = d_last;

        let mut layer_grads = Vec::with_capacity(self.layers.len());
        for (layer, cache) in self.layers.iter().zip(&pass.caches).rev() {
            let (grads, d_inputs) = layer.backward(cache, &d_hidden);
            layer_grads.push(grads);
            d_hidden = d_inputs;
        }

        adam.next_step();
        self.head.apply(&head_grads, adam);
        for (layer, grads) in self.layers.iter_mut().rev().zip(&layer_grads) {
            layer.apply(grads, adam);
        }
        loss
    }
}

fn mse(predicted: &Array2<f64>, target: &Array2<f64>) -> f64 {
    let n = predicted.len();
    if n == 0 {
        return 0.0;
    }
    (predicted - target).mapv(|e| e * e).sum() / n as f64
}
