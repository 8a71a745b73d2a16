// toych-core/src/nn/mod.rs

pub mod init;
pub mod layers;
pub mod losses;
pub mod parameter;

pub use layers::{Dense, Dropout, Layer, Rbf, Transform};
pub use losses::LossKind;
pub use parameter::{ParamId, Parameter, ParameterState};
