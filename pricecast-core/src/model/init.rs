//! Weight initialization.

use ndarray::Array2;
use rand::Rng;

/// Glorot (Xavier) uniform: `U(-l, l)` with `l = sqrt(6 / (fan_in + fan_out))`.
pub fn glorot_uniform<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
    Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-limit..limit))
}
