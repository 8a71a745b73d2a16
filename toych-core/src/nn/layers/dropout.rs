use crate::error::{Result, ToychError};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Inverted dropout: each element is kept with probability `1 - p` and scaled by
/// `1 / (1 - p)`, so no rescaling is needed outside training.
pub struct Dropout {
    p: f64,
    rng: Mutex<StdRng>,
}

impl Dropout {
    /// # Errors
    /// `InvalidArgument` unless `0 <= p < 1`.
    pub fn new(p: f64) -> Result<Self> {
        Dropout::build(p, StdRng::from_entropy())
    }

    /// Same as [`new`](Dropout::new) with reproducible masks.
    pub fn with_seed(p: f64, seed: u64) -> Result<Self> {
        Dropout::build(p, StdRng::seed_from_u64(seed))
    }

    fn build(p: f64, rng: StdRng) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(ToychError::InvalidArgument(format!(
                "dropout probability must be in [0, 1), got {}",
                p
            )));
        }
        Ok(Dropout {
            p,
            rng: Mutex::new(rng),
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    /// Draws a mask of `shape` with entries `0` or `1 / (1 - p)`.
    pub fn mask(&self, shape: &[usize]) -> Result<Tensor> {
        let keep = 1.0 - self.p;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let numel = shape.iter().product();
        let data = (0..numel)
            .map(|_| if rng.gen::<f64>() < keep { 1.0 / keep } else { 0.0 })
            .collect();
        Tensor::new(data, shape.to_vec())
    }
}

impl fmt::Debug for Dropout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dropout").field("p", &self.p).finish()
    }
}

#[cfg(test)]
#[path = "dropout_test.rs"]
mod tests;
