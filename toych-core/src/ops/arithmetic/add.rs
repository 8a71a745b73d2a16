// toych-core/src/ops/arithmetic/add.rs

use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// `a + b` with broadcasting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl Operation for Add {
    fn name(&self) -> &str {
        "add"
    }

    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        inputs[0].add(inputs[1])
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let grad_a = grad_if(ctx.needs_grad(0), || grad_output.reduce_to_shape(ctx.input(0)?.shape()))?;
        let grad_b = grad_if(ctx.needs_grad(1), || grad_output.reduce_to_shape(ctx.input(1)?.shape()))?;
        Ok(vec![grad_a, grad_b])
    }
}

/// Adds two values element-wise, broadcasting as needed.
///
/// # Errors
/// Returns `BroadcastError` if the shapes are incompatible.
pub fn add_op(a: &Var, b: &Var) -> Result<Var> {
    call_op(Add, &[a.clone(), b.clone()])
}

#[cfg(test)]
#[path = "add_test.rs"]
mod tests;
