use crate::error::{Result, ToychError};
use crate::tensor::Tensor;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Default standard deviation for a freshly drawn parameter: `1 / sqrt(shape[0])`.
///
/// Falls back to 1 for scalars and empty leading dimensions.
pub fn default_scale(shape: &[usize]) -> f64 {
    match shape.first() {
        Some(&fan_in) if fan_in > 0 => 1.0 / (fan_in as f64).sqrt(),
        _ => 1.0,
    }
}

/// Draws a tensor of `shape` with entries from N(`mean`, `std`).
///
/// # Arguments
/// * `shape`: Shape of the tensor to create.
/// * `mean`: Mean of the normal distribution.
/// * `std`: Standard deviation, must be finite and non-negative.
/// * `rng`: Source of randomness.
///
/// # Errors
/// Returns `InvalidArgument` if `std` is negative or not finite.
pub fn normal<R: Rng + ?Sized>(shape: &[usize], mean: f64, std: f64, rng: &mut R) -> Result<Tensor> {
    let dist = Normal::new(mean, std).map_err(|e| {
        ToychError::InvalidArgument(format!("invalid normal distribution N({}, {}): {}", mean, std, e))
    })?;
    let numel = shape.iter().product();
    let data = (0..numel).map(|_| dist.sample(rng)).collect();
    Tensor::new(data, shape.to_vec())
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
