use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Element-wise quotient with broadcasting. Division by zero follows IEEE semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Div;

impl Operation for Div {
    fn name(&self) -> &str {
        "div"
    }

    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        inputs[0].div(inputs[1])
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let a = ctx.input(0)?;
        let b = ctx.input(1)?;
        // d(a/b)/da = 1/b
        let grad_a = grad_if(ctx.needs_grad(0), || grad_output.div(b)?.reduce_to_shape(a.shape()))?;
        // d(a/b)/db = -a/b^2
        let grad_b = grad_if(ctx.needs_grad(1), || {
            let local = a.zip_map(b, |x, y| -x / (y * y))?;
            grad_output.mul(&local)?.reduce_to_shape(b.shape())
        })?;
        Ok(vec![grad_a, grad_b])
    }
}

pub fn div_op(a: &Var, b: &Var) -> Result<Var> {
    call_op(Div, &[a.clone(), b.clone()])
}

#[cfg(test)]
#[path = "div_test.rs"]
mod tests;
