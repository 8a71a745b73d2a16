use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::{Result, ToychError};
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Affine map `x @ w + b` for `x: [n, d]`, `w: [d, m]`, `b: [m]`.
///
/// Usually partially applied: binding `w` and `b` to parameters gives a reusable
/// linear transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Affine;

impl Operation for Affine {
    fn name(&self) -> &str {
        "affine"
    }

    fn arity(&self) -> usize {
        3
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        let (x, w, b) = (inputs[0], inputs[1], inputs[2]);
        let xw = x.matmul(w)?;
        let width = xw.shape()[1];
        if b.shape() != [width].as_slice() {
            return Err(ToychError::ShapeMismatch {
                expected: vec![width],
                actual: b.shape().to_vec(),
                operation: "affine bias".to_string(),
            });
        }
        xw.add(b)
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let x = ctx.input(0)?;
        let w = ctx.input(1)?;
        let grad_x = grad_if(ctx.needs_grad(0), || grad_output.matmul(&w.transpose()?))?;
        let grad_w = grad_if(ctx.needs_grad(1), || x.transpose()?.matmul(grad_output))?;
        let grad_b = grad_if(ctx.needs_grad(2), || grad_output.sum_axis(0, false))?;
        Ok(vec![grad_x, grad_w, grad_b])
    }
}

pub fn affine_op(x: &Var, w: &Var, b: &Var) -> Result<Var> {
    call_op(Affine, &[x.clone(), w.clone(), b.clone()])
}

#[cfg(test)]
#[path = "affine_test.rs"]
mod tests;
