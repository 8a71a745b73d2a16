// toych-core/src/ops/math_elem/ln.rs

use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Natural logarithm. Non-positive inputs give `-inf`/`NaN` as in IEEE arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ln;

impl Operation for Ln {
    fn name(&self) -> &str {
        "ln"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        Ok(inputs[0].map(f64::ln))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || grad_output.div(ctx.input(0)?))?])
    }
}

pub fn ln_op(a: &Var) -> Result<Var> {
    call_op(Ln, &[a.clone()])
}

#[cfg(test)]
#[path = "ln_test.rs"]
mod tests;
