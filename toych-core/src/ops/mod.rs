//! Built-in differentiable operations.
//!
//! Each operation is a struct implementing [`Operation`] plus an `xxx_op` helper that
//! calls it on [`Var`]s. The most common ones are also available as methods on `Var`.

use crate::autograd::{function, Operation, Var};
use crate::error::Result;
use std::sync::Arc;

pub mod activation;
pub mod arithmetic;
pub mod linalg;
pub mod math_elem;
pub mod reduction;
pub mod view;

/// Runs `op` on `inputs` through the recording forward driver.
pub(crate) fn call_op<O: Operation + 'static>(op: O, inputs: &[Var]) -> Result<Var> {
    let op: Arc<dyn Operation> = Arc::new(op);
    function::forward(&op, inputs)
}

/// Gradient for input `index` only if someone downstream wants it.
pub(crate) fn grad_if<F>(needed: bool, compute: F) -> Result<Option<crate::tensor::Tensor>>
where
    F: FnOnce() -> Result<crate::tensor::Tensor>,
{
    if needed {
        compute().map(Some)
    } else {
        Ok(None)
    }
}

impl Var {
    pub fn add(&self, other: &Var) -> Result<Var> {
        arithmetic::add_op(self, other)
    }

    pub fn sub(&self, other: &Var) -> Result<Var> {
        arithmetic::sub_op(self, other)
    }

    pub fn mul(&self, other: &Var) -> Result<Var> {
        arithmetic::mul_op(self, other)
    }

    pub fn div(&self, other: &Var) -> Result<Var> {
        arithmetic::div_op(self, other)
    }

    pub fn neg(&self) -> Result<Var> {
        arithmetic::neg_op(self)
    }

    pub fn pow(&self, exponent: f64) -> Result<Var> {
        arithmetic::pow_op(self, exponent)
    }

    pub fn exp(&self) -> Result<Var> {
        math_elem::exp_op(self)
    }

    pub fn ln(&self) -> Result<Var> {
        math_elem::ln_op(self)
    }

    pub fn matmul(&self, other: &Var) -> Result<Var> {
        linalg::matmul_op(self, other)
    }

    pub fn transpose(&self) -> Result<Var> {
        linalg::transpose_op(self)
    }

    pub fn sum(&self) -> Result<Var> {
        reduction::sum_op(self)
    }

    pub fn mean(&self) -> Result<Var> {
        reduction::mean_op(self)
    }

    pub fn reshape(&self, shape: &[usize]) -> Result<Var> {
        view::reshape_op(self, shape)
    }

    pub fn relu(&self) -> Result<Var> {
        activation::relu_op(self)
    }

    pub fn sigmoid(&self) -> Result<Var> {
        activation::sigmoid_op(self)
    }

    pub fn tanh(&self) -> Result<Var> {
        activation::tanh_op(self)
    }

    pub fn softmax(&self) -> Result<Var> {
        activation::softmax_op(self)
    }
}
