use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// `e^x`. The backward rule reuses the recorded output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exp;

impl Operation for Exp {
    fn name(&self) -> &str {
        "exp"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].map(f64::exp))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || grad_output.mul(ctx.output()))?])
    }
}

pub fn exp_op(a: &Var) -> Result<Var> {
    call_op(Exp, &[a.clone()])
}
