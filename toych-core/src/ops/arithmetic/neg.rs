use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default)]
pub struct Neg;

impl Operation for Neg {
    fn name(&self) -> &str {
        "neg"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].scale(-1.0))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || Ok(grad_output.scale(-1.0)))?])
    }
}

pub fn neg_op(a: &Var) -> Result<Var> {
    call_op(Neg, &[a.clone()])
}

#[cfg(test)]
#[path = "neg_test.rs"]
mod tests;
