use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Softmax over the last axis.
///
/// With `s` the output, the vector-Jacobian product is `s * (g - Σ g·s)` per row.
#[derive(Debug, Clone, Copy, Default)]
pub struct Softmax;

impl Operation for Softmax {
    fn name(&self) -> &str {
        "softmax"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].softmax())
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || {
            let s = ctx.output();
            let gs = grad_output.mul(s)?;
            let last = s.rank().saturating_sub(1);
            let dot = if s.rank() == 0 { gs.clone() } else { gs.sum_axis(last, true)? };
            s.mul(&grad_output.sub(&dot)?)
        })?])
    }
}

pub fn softmax_op(a: &Var) -> Result<Var> {
    call_op(Softmax, &[a.clone()])
}
