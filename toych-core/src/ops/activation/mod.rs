//! Activation functions, and the [`Activation`] kind layers are configured with.

use crate::autograd::{Function, Operation};
use crate::error::ToychError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod relu;
pub mod sigmoid;
pub mod softmax;
pub mod tanh;

pub use relu::{relu_op, Relu};
pub use sigmoid::{sigmoid_op, Sigmoid};
pub use softmax::{softmax_op, Softmax};
pub use tanh::{tanh_op, Tanh};

/// Activation applied by a layer after its transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    /// Softmax over the last axis.
    Softmax,
}

impl Activation {
    pub fn operation(&self) -> Arc<dyn Operation> {
        match self {
            Activation::Relu => Arc::new(Relu),
            Activation::Sigmoid => Arc::new(Sigmoid),
            Activation::Tanh => Arc::new(Tanh),
            Activation::Softmax => Arc::new(Softmax),
        }
    }

    pub fn function(&self) -> Function {
        Function::from_arc(self.operation())
    }
}

impl FromStr for Activation {
    type Err = ToychError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "softmax" => Ok(Activation::Softmax),
            other => Err(ToychError::ConfigurationError(format!(
                "unknown activation '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Softmax => "softmax",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
