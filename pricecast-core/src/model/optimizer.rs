//! Adam optimizer.
//!
//! Adam (Adaptive Moment Estimation) keeps exponential moving averages of
//! both the gradients (first moment) and squared gradients (second moment).
//!
//! ```text
//! m = beta1 * m + (1 - beta1) * g
//! v = beta2 * v + (1 - beta2) * g^2
//! w = w - lr * (m / (1 - beta1^t)) / (sqrt(v / (1 - beta2^t)) + epsilon)
//! ```

use ndarray::{Array, Dimension, Zip};

/// A trainable tensor together with its Adam moment estimates.
#[derive(Debug, Clone)]
pub struct Parameter<D: Dimension> {
    pub value: Array<f64, D>,
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> Parameter<D> {
    pub fn new(value: Array<f64, D>) -> Self {
        let m = Array::zeros(value.raw_dim());
        let v = Array::zeros(value.raw_dim());
        Self { value, m, v }
    }
}

/// Adam with Keras-style defaults (epsilon 1e-7).
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: i32,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
        }
    }

    /// Advance the shared timestep. Call once per batch, before `update`.
    pub fn next_step(&mut self) {
        self.t += 1;
    }

    /// Apply one update to `param` using `grad`.
    pub fn update<D: Dimension>(&self, param: &mut Parameter<D>, grad: &Array<f64, D>) {
        let t = self.t.max(1);
        let bias_correction1 = 1.0 - self.beta1.powi(t);
        let bias_correction2 = 1.0 - self.beta2.powi(t);
        let (beta1, beta2, lr, eps) = (self.beta1, self.beta2, self.learning_rate, self.epsilon);

        Zip::from(&mut param.value)
            .and(&mut param.m)
            .and(&mut param.v)
            .and(grad)
            .for_each(|w, m, v, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / bias_correction1;
                let v_hat = *v / bias_correction2;
                *w -= lr * m_hat / (v_hat.sqrt() + eps);
            });
    }
}
