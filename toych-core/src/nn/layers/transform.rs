use crate::autograd::{BackwardContext, Operation};
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::Tensor;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

/// The core computation of a layer, without batching or post-processing.
///
/// A transform starts unbuilt and allocates its parameters in [`setup`](Transform::setup)
/// once the input width is known. `forward` and `backward` always see batched data.
pub trait Transform: Debug + Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Number of output features.
    fn size(&self) -> usize;

    /// Input width, once built.
    fn input_dim(&self) -> Option<usize>;

    fn is_built(&self) -> bool {
        self.input_dim().is_some()
    }

    /// Allocates the parameters for inputs of width `input_dim`.
    fn setup(&mut self, input_dim: usize) -> Result<()>;

    /// Maps `[n, input_dim]` to `[n, size]`.
    ///
    /// # Errors
    /// `NotReady` before setup, `ShapeMismatch` for a wrong input width.
    fn forward(&self, input: &Tensor) -> Result<Tensor>;

    /// Learning step for one recorded forward call.
    ///
    /// `ctx.input(0)` is the batched input and `ctx.output()` the transform's output.
    /// Parameter gradients (or direct updates) go through `ctx`. Returns the error for
    /// the previous layer when `ctx.needs_grad(0)` and the transform has one.
    fn backward(&self, ctx: &mut BackwardContext<'_>, error: &Tensor) -> Result<Option<Tensor>>;

    fn parameters(&self) -> Vec<Parameter>;

    fn named_parameters(&self) -> Vec<(String, Parameter)>;
}

/// Width of the features of a `[d]` or `[n, d]` input.
pub(crate) fn feature_width(shape: &[usize], layer: &str) -> Result<usize> {
    match shape {
        [d] | [_, d] => Ok(*d),
        _ => Err(ToychError::InvalidArgument(format!(
            "{} expects a [features] or [batch, features] input, got shape {:?}",
            layer, shape
        ))),
    }
}

pub(crate) fn check_width<T: Transform + ?Sized>(transform: &T, input: &Tensor) -> Result<usize> {
    let Some(input_dim) = transform.input_dim() else {
        return Err(ToychError::NotReady(format!(
            "{} used before setup",
            transform.name()
        )));
    };
    match input.shape() {
        [n, d] if *d == input_dim => Ok(*n),
        other => Err(ToychError::ShapeMismatch {
            expected: vec![other.first().copied().unwrap_or(1), input_dim],
            actual: other.to_vec(),
            operation: format!("{} forward", transform.name()),
        }),
    }
}

/// A shared transform seen as a single graph operation.
///
/// Both `[d]` and `[n, d]` inputs are accepted; the node keeps the exact input and
/// output, so the same layer can be used any number of times in one graph.
#[derive(Debug)]
pub struct TransformOp<T: Transform> {
    transform: Arc<RwLock<T>>,
}

impl<T: Transform> TransformOp<T> {
    pub fn new(transform: Arc<RwLock<T>>) -> Self {
        TransformOp { transform }
    }
}

impl<T: Transform> Operation for TransformOp<T> {
    fn name(&self) -> &str {
        "transform"
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        let transform = self.transform.read().unwrap_or_else(PoisonError::into_inner);
        let input = inputs[0];
        match input.shape() {
            [d] => {
                let out = transform.forward(&input.reshape(&[1, *d])?)?;
                out.reshape(&[transform.size()])
            }
            _ => transform.forward(input),
        }
    }

    fn backward(&self, ctx: &mut BackwardContext<'_>, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>> {
        let transform = self.transform.read().unwrap_or_else(PoisonError::into_inner);
        let input = ctx.input(0)?.clone();
        let needs = [ctx.needs_grad(0)];
        let upstream = match input.shape() {
            [d] => {
                let d = *d;
                let inputs = [Arc::new(input.reshape(&[1, d])?)];
                let output = ctx.output().reshape(&[1, transform.size()])?;
                let error = grad_output.reshape(&[1, transform.size()])?;
                let mut batched = ctx.with_tensors(&inputs, &output, &needs);
                transform
                    .backward(&mut batched, &error)?
                    .map(|up| up.reshape(&[d]))
                    .transpose()?
            }
            _ => transform.backward(ctx, grad_output)?,
        };
        Ok(vec![upstream.filter(|_| needs[0])])
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.transform
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .parameters()
    }
}
