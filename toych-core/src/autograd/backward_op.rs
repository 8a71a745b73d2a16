use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::Tensor;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A differentiable operation: a pure forward transform plus its local backward rule.
///
/// Operations are stateless with respect to a particular call. Everything the backward
/// rule needs (the exact inputs and the output) is stored in the graph node recorded by
/// [`Function::call`](crate::autograd::Function::call) and handed back through the
/// [`BackwardContext`]. This lets the same operation, or the same layer, appear many
/// times in one graph.
///
/// The trait requires `Debug + Send + Sync` because recorded nodes hold operations as
/// `Arc<dyn Operation>`.
pub trait Operation: Debug + Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Number of inputs `apply` expects.
    fn arity(&self) -> usize;

    /// Computes the output from the input values.
    ///
    /// # Arguments
    /// * `inputs`: Exactly `arity()` tensors, in call order.
    ///
    /// # Errors
    /// Returns `ShapeMismatch`/`BroadcastError` for incompatible inputs.
    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor>;

    /// Computes the gradient of the loss with respect to each input.
    ///
    /// # Arguments
    /// * `ctx`: Saved inputs and output of the recorded call, plus the staging area for
    ///   contributions to parameters owned by the operation.
    /// * `grad_output`: dL/dOutput, with the output's shape.
    ///
    /// # Returns
    /// One entry per input, in call order. `None` means "no gradient for this input";
    /// inputs for which [`BackwardContext::needs_grad`] is false may always return `None`.
    /// A returned gradient must have the shape of the corresponding input, so rules for
    /// broadcasting operations reduce with [`Tensor::reduce_to_shape`].
    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>>;

    /// Parameters the operation owns internally (e.g. a layer's weights).
    ///
    /// Their versions are captured when a node is recorded and checked before backward.
    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }
}

/// Per-pass accumulator for everything a backward pass wants to write into parameters.
///
/// Contributions are summed per parameter identity and only reach the parameters in
/// [`commit`](ParamStaging::commit), after the whole pass succeeded.
#[derive(Debug, Default)]
pub struct ParamStaging {
    grads: HashMap<Parameter, Tensor>,
    grad_order: Vec<Parameter>,
    updates: HashMap<Parameter, Tensor>,
    update_order: Vec<Parameter>,
}

impl ParamStaging {
    /// Stages a gradient contribution for `param`.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `grad` does not have the parameter's shape.
    pub fn accumulate(&mut self, param: &Parameter, grad: Tensor) -> Result<()> {
        Self::stage(&mut self.grads, &mut self.grad_order, param, grad, "accumulate_grad")
    }

    /// Stages a direct (non-gradient) value change `value += delta` for `param`.
    pub fn update(&mut self, param: &Parameter, delta: Tensor) -> Result<()> {
        Self::stage(&mut self.updates, &mut self.update_order, param, delta, "update")
    }

    pub fn is_empty(&self) -> bool {
        self.grads.is_empty() && self.updates.is_empty()
    }

    fn stage(
        slots: &mut HashMap<Parameter, Tensor>,
        order: &mut Vec<Parameter>,
        param: &Parameter,
        contribution: Tensor,
        operation: &str,
    ) -> Result<()> {
        let shape = param.shape();
        if contribution.shape() != shape.as_slice() {
            return Err(ToychError::ShapeMismatch {
                expected: shape,
                actual: contribution.shape().to_vec(),
                operation: format!("{} ({})", operation, param.label()),
            });
        }
        match slots.get_mut(param) {
            Some(acc) => acc.add_assign(&contribution)?,
            None => {
                order.push(param.clone());
                slots.insert(param.clone(), contribution);
            }
        }
        Ok(())
    }

    /// Writes the staged contributions into the parameters.
    ///
    /// # Returns
    /// The parameters that received a gradient, in order of first contribution.
    pub fn commit(mut self) -> Result<Vec<Parameter>> {
        for param in &self.update_order {
            if let Some(delta) = self.updates.remove(param) {
                param.add_to_value(&delta)?;
            }
        }
        for param in &self.grad_order {
            if let Some(grad) = self.grads.remove(param) {
                param.accumulate_grad(&grad)?;
            }
        }
        log::debug!(
            "Committed gradients for {} parameter(s), direct updates for {}",
            self.grad_order.len(),
            self.update_order.len()
        );
        Ok(self.grad_order)
    }
}

/// What an [`Operation::backward`] call gets to see of its recorded node.
#[derive(Debug)]
pub struct BackwardContext<'a> {
    inputs: &'a [Arc<Tensor>],
    output: &'a Tensor,
    needs_grad: &'a [bool],
    staging: &'a mut ParamStaging,
}

impl<'a> BackwardContext<'a> {
    pub fn new(
        inputs: &'a [Arc<Tensor>],
        output: &'a Tensor,
        needs_grad: &'a [bool],
        staging: &'a mut ParamStaging,
    ) -> Self {
        BackwardContext {
            inputs,
            output,
            needs_grad,
            staging,
        }
    }

    /// Saved input `index`.
    ///
    /// # Errors
    /// Returns `InternalError` if the node has no such input.
    pub fn input(&self, index: usize) -> Result<&Tensor> {
        self.inputs.get(index).map(|t| t.as_ref()).ok_or_else(|| {
            ToychError::InternalError(format!(
                "backward asked for input {} of a node with {} input(s)",
                index,
                self.inputs.len()
            ))
        })
    }

    pub fn inputs(&self) -> &[Arc<Tensor>] {
        self.inputs
    }

    /// Output recorded in the forward pass.
    pub fn output(&self) -> &Tensor {
        self.output
    }

    /// Whether input `index` leads to something that receives gradients.
    pub fn needs_grad(&self, index: usize) -> bool {
        self.needs_grad.get(index).copied().unwrap_or(false)
    }

    /// Stages a gradient contribution for a parameter owned by the operation.
    pub fn accumulate(&mut self, param: &Parameter, grad: Tensor) -> Result<()> {
        self.staging.accumulate(param, grad)
    }

    /// Stages a direct value update for a parameter owned by the operation.
    pub fn update(&mut self, param: &Parameter, delta: Tensor) -> Result<()> {
        self.staging.update(param, delta)
    }

    /// A context over other tensors that shares this pass's staging area.
    pub fn with_tensors<'b>(
        &'b mut self,
        inputs: &'b [Arc<Tensor>],
        output: &'b Tensor,
        needs_grad: &'b [bool],
    ) -> BackwardContext<'b> {
        BackwardContext {
            inputs,
            output,
            needs_grad,
            staging: &mut *self.staging,
        }
    }
}

#[cfg(test)]
#[path = "backward_op_test.rs"]
mod tests;
