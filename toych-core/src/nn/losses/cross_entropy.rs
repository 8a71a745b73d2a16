use super::{batch_size, check_same_shape};
use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::{scalar, Tensor};

const EPS: f64 = 1e-12;

/// `-Σ t·ln(p + ε) / n` for probabilities `p`, targets `t` and batch size `n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropy;

impl Operation for CrossEntropy {
    fn name(&self) -> &str {
        "crossentropy"
    }

    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        let (p, t) = (inputs[0], inputs[1]);
        check_same_shape(p, t, "crossentropy")?;
        let total: f64 = p.data().iter().zip(t.data()).map(|(&p, &t)| t * (p + EPS).ln()).sum();
        Ok(scalar(-total / batch_size(p)))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let p = ctx.input(0)?;
        let t = ctx.input(1)?;
        let k = grad_output.item()? / batch_size(p);
        let grad_p = grad_if(ctx.needs_grad(0), || p.zip_map(t, |p, t| -k * t / (p + EPS)))?;
        let grad_t = grad_if(ctx.needs_grad(1), || Ok(p.map(|p| -k * (p + EPS).ln())))?;
        Ok(vec![grad_p, grad_t])
    }
}

pub fn cross_entropy_op(probabilities: &Var, target: &Var) -> Result<Var> {
    call_op(CrossEntropy, &[probabilities.clone(), target.clone()])
}
