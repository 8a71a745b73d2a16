use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Logistic function. The derivative `s * (1 - s)` is read off the recorded output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Operation for Sigmoid {
    fn name(&self) -> &str {
        "sigmoid"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].map(|x| 1.0 / (1.0 + (-x).exp())))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || {
            grad_output.zip_map(ctx.output(), |g, s| g * s * (1.0 - s))
        })?])
    }
}

pub fn sigmoid_op(a: &Var) -> Result<Var> {
    call_op(Sigmoid, &[a.clone()])
}
