// toych-core/src/ops/arithmetic/pow.rs

use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// `x^exponent` for a constant exponent.
#[derive(Debug, Clone, Copy)]
pub struct Pow {
    pub exponent: f64,
}

impl Operation for Pow {
    fn name(&self) -> &str {
        "pow"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        let e = self.exponent;
        Ok(inputs[0].map(|x| x.powf(e)))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let e = self.exponent;
        let x = ctx.input(0)?;
        let grad = grad_if(ctx.needs_grad(0), || {
            grad_output.mul(&x.map(|v| e * v.powf(e - 1.0)))
        })?;
        Ok(vec![grad])
    }
}

pub fn pow_op(a: &Var, exponent: f64) -> Result<Var> {
    call_op(Pow { exponent }, &[a.clone()])
}

#[cfg(test)]
#[path = "pow_test.rs"]
mod tests;
