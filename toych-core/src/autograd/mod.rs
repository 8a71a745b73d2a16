//! Reverse-mode automatic differentiation.
//!
//! Calling a [`Function`] on [`Var`]s records a node in a [`Graph`]; calling
//! [`Var::backward`] on a scalar loss runs the graph's single backward pass and
//! accumulates gradients into every contributing [`Parameter`](crate::nn::Parameter).

pub mod backward_op;
mod backward;
pub mod function;
pub mod grad_check;
pub mod graph;
pub mod mode;
pub mod var;

pub use backward_op::{BackwardContext, Operation, ParamStaging};
pub use function::Function;
pub use graph::{Graph, NodeId};
pub use mode::{is_training, not_training, with_training_mode, TrainingModeGuard};
pub use var::Var;
