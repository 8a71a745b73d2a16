use super::{batch_size, check_same_shape};
use crate::autograd::{BackwardContext, Operation, Var};
use crate::error::Result;
use crate::ops::{call_op, grad_if};
use crate::tensor::{scalar, Tensor};

/// Cross entropy of `softmax(z)` against `t`, computed through log-softmax.
///
/// The gradient with respect to the logits is `(softmax(z) - t) / n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftmaxCrossEntropy;

impl Operation for SoftmaxCrossEntropy {
    fn name(&self) -> &str {
        "softmax_crossentropy"
    }

    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        let (z, t) = (inputs[0], inputs[1]);
        check_same_shape(z, t, "softmax_crossentropy")?;
        let log_p = z.log_softmax();
        let total: f64 = log_p.data().iter().zip(t.data()).map(|(lp, t)| t * lp).sum();
        Ok(scalar(-total / batch_size(z)))
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let z = ctx.input(0)?;
        let t = ctx.input(1)?;
        let k = grad_output.item()? / batch_size(z);
        // Σ_rows t = 1 is not assumed: d/dz = softmax(z)·Σt - t per row.
        let grad_z = grad_if(ctx.needs_grad(0), || {
            let width = z.shape().last().copied().unwrap_or(1).max(1);
            let s = z.softmax();
            let mut data = Vec::with_capacity(z.numel());
            for (s_row, t_row) in s.data().chunks(width).zip(t.data().chunks(width)) {
                let mass: f64 = t_row.iter().sum();
                data.extend(s_row.iter().zip(t_row).map(|(s, t)| k * (s * mass - t)));
            }
            Tensor::new(data, z.shape().to_vec())
        })?;
        let grad_t = grad_if(ctx.needs_grad(1), || Ok(z.log_softmax().scale(-k)))?;
        Ok(vec![grad_z, grad_t])
    }
}

pub fn softmax_cross_entropy_op(logits: &Var, target: &Var) -> Result<Var> {
    call_op(SoftmaxCrossEntropy, &[logits.clone(), target.clone()])
}
