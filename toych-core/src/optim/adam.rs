use super::config::OptimizerConfig;
use super::optimizer_trait::Optimizer;
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::Tensor;
use std::collections::HashMap;

/// Represents the state for a single parameter in the Adam optimizer.
#[derive(Debug, Clone)]
pub struct AdamParamState {
    /// First moment vector (exponential moving average of gradients).
    pub m: Tensor,
    /// Second moment vector (exponential moving average of squared gradients).
    pub v: Tensor,
}

/// Adam optimizer with bias-corrected moment estimates.
///
/// The step counter `t` advances once per [`step`](Optimizer::step) call, shared by
/// all parameters.
#[derive(Debug)]
pub struct Adam {
    config: OptimizerConfig,
    b1: f64,
    b2: f64,
    eps: f64,
    t: u64,
    state: HashMap<Parameter, AdamParamState>,
}

impl Adam {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Adam {
            config,
            b1: 0.9,
            b2: 0.999,
            eps: 1e-8,
            t: 0,
            state: HashMap::new(),
        })
    }

    /// # Errors
    /// `ConfigurationError` unless both betas are in `[0, 1)`.
    pub fn with_betas(mut self, b1: f64, b2: f64) -> Result<Self> {
        for (name, beta) in [("b1", b1), ("b2", b2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(ToychError::ConfigurationError(format!(
                    "{} must be in [0, 1), got {}",
                    name, beta
                )));
            }
        }
        self.b1 = b1;
        self.b2 = b2;
        Ok(self)
    }

    /// # Errors
    /// `ConfigurationError` if `eps` is not positive.
    pub fn with_eps(mut self, eps: f64) -> Result<Self> {
        if !(eps > 0.0) {
            return Err(ToychError::ConfigurationError(format!(
                "epsilon must be positive, got {}",
                eps
            )));
        }
        self.eps = eps;
        Ok(self)
    }

    /// Number of steps taken so far.
    pub fn iterations(&self) -> u64 {
        self.t
    }

    pub fn param_state(&self, param: &Parameter) -> Option<&AdamParamState> {
        self.state.get(param)
    }
}

impl Optimizer for Adam {
    fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update(&mut self, param: &Parameter, grad: &Tensor) -> Result<()> {
        if self.t == 0 {
            return Err(ToychError::InternalError(
                "Adam update outside of a step".to_string(),
            ));
        }
        let (b1, b2) = (self.b1, self.b2);
        let entry = self.state.entry(param.clone()).or_insert_with(|| AdamParamState {
            m: crate::tensor::zeros_like(grad),
            v: crate::tensor::zeros_like(grad),
        });
        entry.m = entry.m.scale(b1).add(&grad.scale(1.0 - b1))?;
        entry.v = entry.v.scale(b2).add(&grad.map(|g| g * g).scale(1.0 - b2))?;

        let t = i32::try_from(self.t).unwrap_or(i32::MAX);
        let bias_correction1 = 1.0 - b1.powi(t);
        let bias_correction2 = 1.0 - b2.powi(t);
        let (lr, eps) = (self.config.lr, self.eps);
        let step = entry.m.zip_map(&entry.v, |m, v| {
            let m_hat = m / bias_correction1;
            let v_hat = v / bias_correction2;
            -lr * m_hat / (v_hat.sqrt() + eps)
        })?;
        param.add_to_value(&step)
    }
}

#[cfg(test)]
#[path = "adam_test.rs"]
mod tests;
