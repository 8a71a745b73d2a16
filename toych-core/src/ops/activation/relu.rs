use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// `max(x, 0)`. The gradient at exactly 0 is taken as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relu;

impl Operation for Relu {
    fn name(&self) -> &str {
        "relu"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].map(|x| x.max(0.0)))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || {
            grad_output.zip_map(ctx.input(0)?, |g, x| if x > 0.0 { g } else { 0.0 })
        })?])
    }
}

pub fn relu_op(a: &Var) -> Result<Var> {
    call_op(Relu, &[a.clone()])
}
