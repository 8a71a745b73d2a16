use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Mean of all elements, producing a scalar.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Operation for Mean {
    fn name(&self) -> &str {
        "mean"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].mean())
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || {
            let input = ctx.input(0)?;
            let n = input.numel().max(1) as f64;
            Ok(grad_output.broadcast_to(input.shape())?.scale(1.0 / n))
        })?])
    }
}

pub fn mean_op(a: &Var) -> Result<Var> {
    call_op(Mean, &[a.clone()])
}

#[cfg(test)]
#[path = "mean_test.rs"]
mod tests;
