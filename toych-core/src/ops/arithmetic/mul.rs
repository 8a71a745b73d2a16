use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Element-wise product with broadcasting.
///
/// d(a*b)/da = b and d(a*b)/db = a, each reduced back to its input's shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mul;

impl Operation for Mul {
    fn name(&self) -> &str {
        "mul"
    }

    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        inputs[0].mul(inputs[1])
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let a = ctx.input(0)?;
        let b = ctx.input(1)?;
        let grad_a = grad_if(ctx.needs_grad(0), || grad_output.mul(b)?.reduce_to_shape(a.shape()))?;
        let grad_b = grad_if(ctx.needs_grad(1), || grad_output.mul(a)?.reduce_to_shape(b.shape()))?;
        Ok(vec![grad_a, grad_b])
    }
}

pub fn mul_op(a: &Var, b: &Var) -> Result<Var> {
    call_op(Mul, &[a.clone(), b.clone()])
}

#[cfg(test)]
#[path = "mul_test.rs"]
mod tests;
