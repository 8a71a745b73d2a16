use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default)]
pub struct Transpose;

impl Operation for Transpose {
    fn name(&self) -> &str {
        "transpose"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        inputs[0].transpose()
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || grad_output.transpose())?])
    }
}

pub fn transpose_op(a: &Var) -> Result<Var> {
    call_op(Transpose, &[a.clone()])
}
