use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Sum of all elements, producing a scalar.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl Operation for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].sum())
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || {
            grad_output.broadcast_to(ctx.input(0)?.shape())
        })?])
    }
}

pub fn sum_op(a: &Var) -> Result<Var> {
    call_op(Sum, &[a.clone()])
}

#[cfg(test)]
#[path = "sum_test.rs"]
mod tests;
