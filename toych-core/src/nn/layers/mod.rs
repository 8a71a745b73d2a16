// toych-core/src/nn/layers/mod.rs

//! Stateful layers: a [`Transform`] owning its parameters, wrapped by [`Layer`] for
//! batching, build-on-first-use, activation and dropout.

pub mod dense;
pub mod dropout;
pub mod layer;
pub mod rbf;
pub mod transform;

pub use dense::Dense;
pub use dropout::Dropout;
pub use layer::Layer;
pub use rbf::Rbf;
pub use transform::{Transform, TransformOp};
