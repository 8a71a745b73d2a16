use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::Tensor;

/// Changes the shape, keeping the element count and row-major order.
#[derive(Debug, Clone)]
pub struct Reshape {
    pub shape: Vec<usize>,
}

impl Operation for Reshape {
    fn name(&self) -> &str {
        "reshape"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        inputs[0].reshape(&self.shape)
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        Ok(vec![grad_if(ctx.needs_grad(0), || {
            grad_output.reshape(ctx.input(0)?.shape())
        })?])
    }
}

/// # Errors
/// Returns `ShapeMismatch` if `shape` holds a different number of elements.
pub fn reshape_op(a: &Var, shape: &[usize]) -> Result<Var> {
    call_op(Reshape { shape: shape.to_vec() }, &[a.clone()])
}

#[cfg(test)]
#[path = "reshape_test.rs"]
mod tests;
