use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default)]
pub struct Tanh;

impl Operation for Tanh {
    fn name(&self) -> &str {
        "tanh"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].map(f64::tanh))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || {
            grad_output.zip_map(ctx.output(), |g, t| g * (1.0 - t * t))
        })?])
    }
}

pub fn tanh_op(a: &Var) -> Result<Var> {
    call_op(Tanh, &[a.clone()])
}
