// toych-core/src/optim/sgd.rs

use super::config::OptimizerConfig;
use super::optimizer_trait::Optimizer;
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::Tensor;
use std::collections::HashMap;

/// Gradient descent with momentum.
///
/// The first update of a parameter is `Δ = -g`; later ones are
/// `Δ = m·Δ_prev - (1 - m)·g`. The parameter moves by `lr·Δ`.
#[derive(Debug)]
pub struct Sgd {
    config: OptimizerConfig,
    momentum: f64,
    old_delta: HashMap<Parameter, Tensor>,
}

impl Sgd {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Sgd {
            config,
            momentum: 0.0,
            old_delta: HashMap::new(),
        })
    }

    /// # Errors
    /// `ConfigurationError` unless `0 <= momentum < 1`.
    pub fn with_momentum(mut self, momentum: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&momentum) {
            return Err(ToychError::ConfigurationError(format!(
                "momentum must be in [0, 1), got {}",
                momentum
            )));
        }
        self.momentum = momentum;
        Ok(self)
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }
}

impl Optimizer for Sgd {
    fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    fn update(&mut self, param: &Parameter, grad: &Tensor) -> Result<()> {
        let delta = match self.old_delta.get(param) {
            Some(prev) => prev.scale(self.momentum).sub(&grad.scale(1.0 - self.momentum))?,
            None => grad.scale(-1.0),
        };
        param.add_to_value(&delta.scale(self.config.lr))?;
        self.old_delta.insert(param.clone(), delta);
        Ok(())
    }
}

#[cfg(test)]
#[path = "sgd_test.rs"]
mod tests;
