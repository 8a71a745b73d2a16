//! Loss functions and the [`LossKind`] a training run is configured with.

use crate::autograd::{Function, Operation, Var};
use crate::error::{Result, ToychError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod cross_entropy;
pub mod mse;
pub mod softmax_cross_entropy;

pub use cross_entropy::{cross_entropy_op, CrossEntropy};
pub use mse::{mse_op, Mse};
pub use softmax_cross_entropy::{softmax_cross_entropy_op, SoftmaxCrossEntropy};

/// Number of samples a loss averages over: the leading dimension of a rank-2
/// prediction, 1 otherwise.
pub(crate) fn batch_size(prediction: &crate::tensor::Tensor) -> f64 {
    match prediction.shape() {
        [n, _] if *n > 0 => *n as f64,
        _ => 1.0,
    }
}

pub(crate) fn check_same_shape(pred: &crate::tensor::Tensor, target: &crate::tensor::Tensor, op: &str) -> Result<()> {
    if pred.shape() != target.shape() {
        return Err(ToychError::ShapeMismatch {
            expected: pred.shape().to_vec(),
            actual: target.shape().to_vec(),
            operation: op.to_string(),
        });
    }
    Ok(())
}

/// Loss selected by name once, at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LossKind {
    /// Mean squared error over all elements.
    #[default]
    Mse,
    /// Cross entropy of probabilities against targets.
    CrossEntropy,
    /// Cross entropy applied to logits through a softmax.
    SoftmaxCrossEntropy,
}

impl LossKind {
    pub fn operation(&self) -> Arc<dyn Operation> {
        match self {
            LossKind::Mse => Arc::new(Mse),
            LossKind::CrossEntropy => Arc::new(CrossEntropy),
            LossKind::SoftmaxCrossEntropy => Arc::new(SoftmaxCrossEntropy),
        }
    }

    pub fn function(&self) -> Function {
        Function::from_arc(self.operation())
    }

    /// Scalar loss of `prediction` against `target`.
    pub fn compute(&self, prediction: &Var, target: &Var) -> Result<Var> {
        self.function().call(&[prediction.clone(), target.clone()])
    }
}

impl FromStr for LossKind {
    type Err = ToychError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mse" | "l2" => Ok(LossKind::Mse),
            "crossentropy" | "cross_entropy" | "ce" => Ok(LossKind::CrossEntropy),
            "softmax_crossentropy" | "softmax_cross_entropy" | "softmax_ce" | "smce" => {
                Ok(LossKind::SoftmaxCrossEntropy)
            }
            other => Err(ToychError::ConfigurationError(format!(
                "unknown loss '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LossKind::Mse => "mse",
            LossKind::CrossEntropy => "crossentropy",
            LossKind::SoftmaxCrossEntropy => "softmax_crossentropy",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "losses_test.rs"]
mod tests;
