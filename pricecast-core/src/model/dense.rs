//! Fully connected linear output layer.

use super::init::glorot_uniform;
use super::optimizer::{Adam, Parameter};
use ndarray::{Array1, Array2, Axis, Ix1, Ix2};
use rand::Rng;

/// `y = x · W + b` with no activation.
#[derive(Debug, Clone)]
pub struct Dense {
    weights: Parameter<Ix2>,
    bias: Parameter<Ix1>,
}

/// Gradients for one `Dense::backward` call.
#[derive(Debug, Clone)]
pub struct DenseGradients {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        Self {
            weights: Parameter::new(glorot_uniform(input_size, output_size, rng)),
            bias: Parameter::new(Array1::zeros(output_size)),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.value.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.value.ncols()
    }

    /// `x` is `batch × input_size`.
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        x.dot(&self.weights.value) + &self.bias.value
    }

    /// Returns parameter gradients and the gradient with respect to `x`.
    pub fn backward(&self, x: &Array2<f64>, d_out: &Array2<f64>) -> (DenseGradients, Array2<f64>) {
        let grads = DenseGradients {
            weights: x.t().dot(d_out),
            bias: d_out.sum_axis(Axis(0)),
        };
        let d_x = d_out.dot(&self.weights.value.t());
        (grads, d_x)
    }

    pub fn apply(&mut self, grads: &DenseGradients, adam: &Adam) {
        adam.update(&mut self.weights, &grads.weights);
        adam.update(&mut self.bias, &grads.bias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn backward_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Dense::new(3, 2, &mut rng);
        let x = array![[0.2, -0.4, 0.9], [1.0, 0.5, -0.3]];

        // loss = sum(y)
        let d_out = Array2::ones((2, 2));
        let (_, d_x) = layer.backward(&x, &d_out);

        let eps = 1e-6;
        let mut bumped = x.clone();
        bumped[[1, 2]] += eps;
        let numeric = (layer.forward(&bumped).sum() - layer.forward(&x).sum()) / eps;
        assert!((numeric - d_x[[1, 2]]).abs() < 1e-5);
    }
}
