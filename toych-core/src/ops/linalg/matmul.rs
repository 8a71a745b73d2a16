use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Matrix product `[m, k] x [k, n] -> [m, n]`.
///
/// For `C = A @ B`: dL/dA = dL/dC @ Bᵀ and dL/dB = Aᵀ @ dL/dC.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatMul;

impl Operation for MatMul {
    fn name(&self) -> &str {
        "matmul"
    }

    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        inputs[0].matmul(inputs[1])
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let a = ctx.input(0)?;
        let b = ctx.input(1)?;
        let grad_a = grad_if(ctx.needs_grad(0), || grad_output.matmul(&b.transpose()?))?;
        let grad_b = grad_if(ctx.needs_grad(1), || a.transpose()?.matmul(grad_output))?;
        Ok(vec![grad_a, grad_b])
    }
}

/// # Errors
/// Returns `ShapeMismatch` if an operand is not rank 2 or the inner dimensions differ.
pub fn matmul_op(a: &Var, b: &Var) -> Result<Var> {
    call_op(MatMul, &[a.clone(), b.clone()])
}

#[cfg(test)]
#[path = "matmul_test.rs"]
mod tests;
