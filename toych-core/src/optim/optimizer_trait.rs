use super::config::{OptimizerConfig, Regularization};
use super::grad_clipping::shrink_grad;
use crate::autograd::not_training;
use crate::error::Result;
use crate::nn::Parameter;
use crate::tensor::Tensor;
use std::fmt::Debug;

/// Trait defining the common interface for all optimizers.
///
/// Running state (momentum, moment estimates) is keyed by [`Parameter`] identity, so
/// the same optimizer can be handed a different subset of parameters at each step.
pub trait Optimizer: Debug + Send {
    fn config(&self) -> &OptimizerConfig;

    /// Called once at the start of every [`step`](Optimizer::step).
    fn begin_step(&mut self) {}

    /// Applies the update rule to one parameter, given its (limited) gradient.
    fn update(&mut self, param: &Parameter, grad: &Tensor) -> Result<()>;

    /// Performs a single optimization step over `params`.
    ///
    /// Inside a not-training scope, every parameter with a gradient has it limited
    /// to `grad_lim`, goes through [`update`](Optimizer::update), is regularized, and
    /// gets its gradient cleared. Parameters without a gradient are skipped.
    fn step(&mut self, params: &[Parameter]) -> Result<()> {
        let _guard = not_training();
        self.begin_step();
        for param in params {
            if !param.has_grad() {
                log::debug!("Skipping {} without gradient", param.label());
                continue;
            }
            let mut grad = param.grad();
            if let Some(lim) = self.config().grad_lim {
                grad = shrink_grad(&grad, lim)?;
            }
            self.update(param, &grad)?;
            regularize(param, self.config())?;
            param.zero_grad();
        }
        Ok(())
    }
}

/// Applies the configured penalty to `param`.
pub fn regularize(param: &Parameter, config: &OptimizerConfig) -> Result<()> {
    let Some(reg) = config.regularization else {
        return Ok(());
    };
    let k = config.lr * config.lambda;
    param.update_value(|value| {
        for v in value.data_mut() {
            *v -= k * match reg {
                Regularization::L1 => sign(*v),
                Regularization::L2 => *v,
            };
        }
        Ok(())
    })
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
#[path = "optimizer_trait_test.rs"]
mod tests;
