//! Matrix operations on rank-2 values.

pub mod affine;
pub mod matmul;
pub mod transpose;

pub use affine::{affine_op, Affine};
pub use matmul::{matmul_op, MatMul};
pub use transpose::{transpose_op, Transpose};
