//! Long Short-Term Memory layer with backpropagation through time.
//!
//! Gates are packed column-wise in the order input, forget, cell candidate,
//! output, so one matrix product per timestep computes all four:
//!
//! ```text
//! z = x_t · K + h_{t-1} · R + b            (batch × 4H)
//! i = σ(z_i)   f = σ(z_f)   g = tanh(z_g)   o = σ(z_o)
//! c_t = f ⊙ c_{t-1} + i ⊙ g
//! h_t = o ⊙ tanh(c_t)
//! ```

use super::init::glorot_uniform;
use super::optimizer::{Adam, Parameter};
use ndarray::{s, Array1, Array2, Axis, Ix1, Ix2};
use rand::Rng;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// One LSTM layer; always returns the full hidden sequence.
#[derive(Debug, Clone)]
pub struct LstmLayer {
    hidden_size: usize,
    kernel: Parameter<Ix2>,
    recurrent: Parameter<Ix2>,
    bias: Parameter<Ix1>,
}

/// Activations kept from the forward pass for one timestep.
#[derive(Debug, Clone)]
struct StepCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    tanh_c: Array2<f64>,
}

/// Everything `backward` needs from a forward pass.
#[derive(Debug, Clone)]
pub struct LstmCache {
    steps: Vec<StepCache>,
}

/// Parameter gradients accumulated over a whole sequence.
#[derive(Debug, Clone)]
pub struct LstmGradients {
    pub kernel: Array2<f64>,
    pub recurrent: Array2<f64>,
    pub bias: Array1<f64>,
}

impl LstmLayer {
    /// Glorot-uniform weights, zero bias except a forget-gate bias of 1.
    pub fn new<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let gates = 4 * hidden_size;
        let mut bias = Array1::zeros(gates);
        bias.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            hidden_size,
            kernel: Parameter::new(glorot_uniform(input_size, gates, rng)),
            recurrent: Parameter::new(glorot_uniform(hidden_size, gates, rng)),
            bias: Parameter::new(bias),
        }
    }

    pub fn input_size(&self) -> usize {
        self.kernel.value.nrows()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Run the layer over `inputs` (one `batch × input_size` matrix per
    /// timestep) from a zero state.
    pub fn forward(&self, inputs: &[Array2<f64>]) -> (Vec<Array2<f64>>, LstmCache) {
        let batch = inputs.first().map_or(0, |x| x.nrows());
        let hs = self.hidden_size;

        let mut h = Array2::<f64>::zeros((batch, hs));
        let mut c = Array2::<f64>::zeros((batch, hs));
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut steps = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = x.dot(&self.kernel.value) + h.dot(&self.recurrent.value) + &self.bias.value;
            let i = z.slice(s![.., 0..hs]).mapv(sigmoid);
            let f = z.slice(s![.., hs..2 * hs]).mapv(sigmoid);
            let g = z.slice(s![.., 2 * hs..3 * hs]).mapv(f64::tanh);
            let o = z.slice(s![.., 3 * hs..4 * hs]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            steps.push(StepCache {
                x: x.clone(),
                h_prev: h,
                c_prev: c,
                i,
                f,
                g,
                o,
                tanh_c,
            });
            outputs.push(h_next.clone());
            h = h_next;
            c = c_next;
        }

        (outputs, LstmCache { steps })
    }

    /// Backpropagate `d_hidden` (gradient of the loss with respect to each
    /// output hidden state) through time.
    ///
    /// Returns parameter gradients and the gradient with respect to each input.
    pub fn backward(
        &self,
        cache: &LstmCache,
        d_hidden: &[Array2<f64>],
    ) -> (LstmGradients, Vec<Array2<f64>>) {
        let hs = self.hidden_size;
        let mut grads = LstmGradients {
            kernel: Array2::zeros(self.kernel.value.raw_dim()),
            recurrent: Array2::zeros(self.recurrent.value.raw_dim()),
            bias: Array1::zeros(self.bias.value.raw_dim()),
        };
        let mut d_inputs = vec![Array2::zeros((0, 0)); cache.steps.len()];

        let batch = cache.steps.first().map_or(0, |s| s.x.nrows());
        let mut dh_next = Array2::<f64>::zeros((batch, hs));
        let mut dc_next = Array2::<f64>::zeros((batch, hs));

        for (t, step) in cache.steps.iter().enumerate().rev() {
            let dh = &d_hidden[t] + &dh_next;

            let d_o = &dh * &step.tanh_c;
            let dc = &dh * &step.o * &step.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;
            let d_i = &dc * &step.g;
            let d_g = &dc * &step.i;
            let d_f = &dc * &step.c_prev;
            dc_next = &dc * &step.f;

            let mut dz = Array2::<f64>::zeros((batch, 4 * hs));
            dz.slice_mut(s![.., 0..hs])
                .assign(&(&d_i * &step.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., hs..2 * hs])
                .assign(&(&d_f * &step.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * hs..3 * hs])
                .assign(&(&d_g * &step.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * hs..4 * hs])
                .assign(&(&d_o * &step.o.mapv(|v| v * (1.0 - v))));

            grads.kernel += &step.x.t().dot(&dz);
            grads.recurrent += &step.h_prev.t().dot(&dz);
            grads.bias += &dz.sum_axis(Axis(0));

            d_inputs[t] = dz.dot(&self.kernel.value.t());
            dh_next = dz.dot(&self.recurrent.value.t());
        }

        (grads, d_inputs)
    }

    pub fn apply(&mut self, grads: &LstmGradients, adam: &Adam) {
        adam.update(&mut self.kernel, &grads.kernel);
        adam.update(&mut self.recurrent, &grads.recurrent);
        adam.update(&mut self.bias, &grads.bias);
    }
}
