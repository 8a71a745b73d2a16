//! Reductions to a scalar.

pub mod mean;
pub mod sum;

pub use mean::{mean_op, Mean};
pub use sum::{sum_op, Sum};
