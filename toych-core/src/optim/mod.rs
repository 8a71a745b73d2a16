// toych-core/src/optim/mod.rs

//! Optimizers: update rules that consume the gradients left by a backward pass.

pub mod adam;
pub mod config;
pub mod grad_clipping;
pub mod optimizer_trait;
pub mod sgd;

pub use adam::Adam;
pub use config::{OptimizerConfig, OptimizerKind, Regularization};
pub use optimizer_trait::Optimizer;
pub use sgd::Sgd;
