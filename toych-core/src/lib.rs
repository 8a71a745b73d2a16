//! Core of toych: tensors, parameters, a reverse-mode autograd engine, layers,
//! losses, optimizers and a training loop.

pub mod autograd;
pub mod ops;
pub mod tensor;

pub mod model;
pub mod nn;
pub mod optim;
pub mod utils;

pub use autograd::{Function, Var};
pub use nn::Parameter;
pub use tensor::Tensor;

pub mod error;
pub use error::{Result, ToychError};
