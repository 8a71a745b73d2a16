// toych-core/src/nn/losses/mse.rs

use super::check_same_shape;
use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::{scalar, Tensor};

/// `mean((y - t)^2)` over all elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl Operation for Mse {
    fn name(&self) -> &str {
        "mse"
    }

    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        check_same_shape(inputs[0], inputs[1], "mse")?;
        let diff = inputs[0].sub(inputs[1])?;
        let n = diff.numel().max(1) as f64;
        Ok(scalar(diff.data().iter().map(|d| d * d).sum::<f64>() / n))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let y = ctx.input(0)?;
        let t = ctx.input(1)?;
        let g = grad_output.item()?;
        let n = y.numel().max(1) as f64;
        let dy = y.sub(t)?.scale(2.0 * g / n);
        let grad_t = grad_if(ctx.needs_grad(1), || Ok(dy.scale(-1.0)))?;
        let grad_y = ctx.needs_grad(0).then_some(dy);
        Ok(vec![grad_y, grad_t])
    }
}

pub fn mse_op(prediction: &Var, target: &Var) -> Result<Var> {
    call_op(Mse, &[prediction.clone(), target.clone()])
}
