//! Trainable models built from layers and functions, and the training loop.

use crate::autograd::{Function, Var};
use crate::error::Result;
use crate::nn::layers::{Layer, Transform};
use crate::nn::Parameter;
use std::fmt::Debug;

pub mod compose;
pub mod fit;
pub mod lstm;

pub use compose::Compose;
pub use fit::{fit, BatchSource, Callback, FitConfig, History, Metric};
pub use lstm::Lstm;

/// Anything mapping an input [`Var`] to an output `Var` through trainable parameters.
///
/// `forward` takes `&mut self` so stateful models (e.g. [`Lstm`]) can carry state from
/// one call to the next.
pub trait Model: Debug + Send {
    fn forward(&mut self, input: &Var) -> Result<Var>;

    /// Parameters reached by `forward`, each listed once.
    fn parameters(&self) -> Vec<Parameter>;

    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        self.parameters()
            .into_iter()
            .enumerate()
            .map(|(i, p)| (p.name().unwrap_or_else(|| format!("param{}", i)), p))
            .collect()
    }
}

impl<T: Transform + 'static> Model for Layer<T> {
    fn forward(&mut self, input: &Var) -> Result<Var> {
        self.call(input)
    }

    fn parameters(&self) -> Vec<Parameter> {
        Layer::parameters(self)
    }

    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        Layer::named_parameters(self)
    }
}

/// A unary function used as a model, e.g. an affine operation bound to its weights.
impl Model for Function {
    fn forward(&mut self, input: &Var) -> Result<Var> {
        self.call(std::slice::from_ref(input))
    }

    fn parameters(&self) -> Vec<Parameter> {
        Function::parameters(self)
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
