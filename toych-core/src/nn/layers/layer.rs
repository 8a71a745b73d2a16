use super::dropout::Dropout;
use super::transform::{feature_width, Transform, TransformOp};
use crate::autograd::{function, is_training, BackwardContext, Operation, ParamStaging, Var};
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::ops::activation::Activation;
use crate::tensor::Tensor;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// State kept between a direct `forward` and the matching `backward`.
#[derive(Debug)]
struct ForwardCache {
    input: Arc<Tensor>,
    pre_activation: Arc<Tensor>,
    activated: Tensor,
    mask: Option<Tensor>,
    unbatched: bool,
    versions: Vec<(Parameter, u64)>,
}

/// A [`Transform`] plus the batching, activation and dropout around it.
///
/// A layer can be driven two ways:
/// * directly, with [`forward`](Layer::forward) on a tensor followed by
///   [`backward`](Layer::backward) on the error, in the style of a classic
///   layer-by-layer network;
/// * in graph mode with [`call`](Layer::call), where the transform, activation and
///   dropout become nodes of the autograd graph and a loss's `backward` reaches the
///   layer's parameters.
///
/// # Example
/// ```
/// use toych_core::nn::layers::{Dense, Layer};
/// use toych_core::ops::activation::Activation;
/// use toych_core::tensor::Tensor;
///
/// let mut layer = Layer::new(Dense::new(2).with_seed(7)).with_activation(Activation::Tanh);
/// let y = layer.forward(&Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap()).unwrap();
/// assert_eq!(y.shape(), &[2]);
/// assert_eq!(layer.input_dim(), Some(3));
/// ```
pub struct Layer<T: Transform> {
    transform: Arc<RwLock<T>>,
    activation: Option<Activation>,
    dropout: Option<Dropout>,
    cache: Option<ForwardCache>,
}

impl<T: Transform + 'static> Layer<T> {
    pub fn new(transform: T) -> Self {
        Layer {
            transform: Arc::new(RwLock::new(transform)),
            activation: None,
            dropout: None,
            cache: None,
        }
    }

    /// Builds the layer now instead of on first use.
    pub fn with_input_dim(self, input_dim: usize) -> Result<Self> {
        self.ensure_built(input_dim)?;
        Ok(self)
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn with_dropout(mut self, dropout: Dropout) -> Self {
        self.dropout = Some(dropout);
        self
    }

    pub fn transform(&self) -> RwLockReadGuard<'_, T> {
        self.transform.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn transform_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.transform.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn size(&self) -> usize {
        self.transform().size()
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.transform().input_dim()
    }

    pub fn is_built(&self) -> bool {
        self.transform().is_built()
    }

    pub fn activation(&self) -> Option<Activation> {
        self.activation
    }

    pub fn dropout(&self) -> Option<&Dropout> {
        self.dropout.as_ref()
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        self.transform().parameters()
    }

    pub fn named_parameters(&self) -> Vec<(String, Parameter)> {
        self.transform().named_parameters()
    }

    /// Whether a forward pass is waiting for its backward.
    pub fn has_pending_forward(&self) -> bool {
        self.cache.is_some()
    }

    /// Sets the transform up for `width` inputs, or checks an existing setup.
    fn ensure_built(&self, width: usize) -> Result<()> {
        let mut transform = self.transform_mut();
        match transform.input_dim() {
            Some(d) if d == width => Ok(()),
            Some(d) => Err(ToychError::ShapeMismatch {
                expected: vec![d],
                actual: vec![width],
                operation: format!("{} input width", transform.name()),
            }),
            None => transform.setup(width),
        }
    }

    /// Direct forward pass on `[d]` or `[n, d]` input.
    ///
    /// In training mode the input and intermediate values are kept for
    /// [`backward`](Layer::backward); outside it nothing is kept and dropout is skipped.
    /// The output has shape `[size]` for an unbatched input, `[n, size]` otherwise.
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let width = feature_width(input.shape(), "layer")?;
        self.ensure_built(width)?;
        let unbatched = input.rank() == 1;
        let batched = if unbatched {
            input.reshape(&[1, width])?
        } else {
            input.clone()
        };

        let pre_activation = self.transform().forward(&batched)?;
        let activated = match self.activation {
            Some(act) => act.operation().apply(&[&pre_activation])?,
            None => pre_activation.clone(),
        };
        let training = is_training();
        let mask = match (&self.dropout, training) {
            (Some(dropout), true) => Some(dropout.mask(activated.shape())?),
            _ => None,
        };
        let output = match &mask {
            Some(m) => activated.mul(m)?,
            None => activated.clone(),
        };

        self.cache = if training {
            let versions = self
                .parameters()
                .into_iter()
                .map(|p| {
                    let v = p.version();
                    (p, v)
                })
                .collect();
            Some(ForwardCache {
                input: Arc::new(batched),
                pre_activation: Arc::new(pre_activation),
                activated,
                mask,
                unbatched,
                versions,
            })
        } else {
            None
        };

        if unbatched {
            output.reshape(&[self.size()])
        } else {
            Ok(output)
        }
    }

    /// Direct backward pass for the last [`forward`](Layer::forward).
    ///
    /// Undoes dropout then the activation, runs the transform's learning step and
    /// commits its parameter contributions. Returns the error for the previous layer
    /// (batched like the forward input) when `pass_error` is true.
    ///
    /// Without a pending forward this is a no-op returning `Ok(None)`.
    ///
    /// # Errors
    /// `ShapeMismatch` if `error` does not have the last output's shape, `StaleGraph`
    /// if the parameters changed since the forward pass.
    pub fn backward(&mut self, error: &Tensor, pass_error: bool) -> Result<Option<Tensor>> {
        let Some(cache) = self.cache.as_ref() else {
            log::debug!("backward on a layer without a pending forward, skipping");
            return Ok(None);
        };
        let out_shape = cache.activated.shape();
        let expected: Vec<usize> = if cache.unbatched {
            out_shape[1..].to_vec()
        } else {
            out_shape.to_vec()
        };
        if error.shape() != expected.as_slice() {
            return Err(ToychError::ShapeMismatch {
                expected,
                actual: error.shape().to_vec(),
                operation: "layer backward".to_string(),
            });
        }
        for (param, recorded) in &cache.versions {
            let current = param.version();
            if current != *recorded {
                return Err(ToychError::StaleGraph {
                    parameter: param.label(),
                    recorded: *recorded,
                    current,
                });
            }
        }
        let Some(cache) = self.cache.take() else {
            return Ok(None);
        };

        let mut error = error.reshape(cache.activated.shape())?;
        if let Some(mask) = &cache.mask {
            error = error.mul(mask)?;
        }

        let mut staging = ParamStaging::default();
        if let Some(act) = self.activation {
            let inputs = [Arc::clone(&cache.pre_activation)];
            let mut ctx = BackwardContext::new(&inputs, &cache.activated, &[true], &mut staging);
            error = act
                .operation()
                .backward(&mut ctx, &error)?
                .into_iter()
                .next()
                .flatten()
                .ok_or_else(|| ToychError::InternalError(format!("{} returned no gradient", act)))?;
        }

        let inputs = [Arc::clone(&cache.input)];
        let needs = [pass_error];
        let upstream = {
            let mut ctx = BackwardContext::new(&inputs, &cache.pre_activation, &needs, &mut staging);
            self.transform().backward(&mut ctx, &error)?
        };
        staging.commit()?;

        match upstream.filter(|_| pass_error) {
            Some(up) if cache.unbatched => Ok(Some(up.reshape(&up.shape()[1..])?)),
            other => Ok(other),
        }
    }

    /// Graph-mode application to a `[d]` or `[n, d]` value.
    ///
    /// Records the transform as one node, followed by the activation and, in training
    /// mode, a dropout mask multiplication.
    pub fn call(&self, input: &Var) -> Result<Var> {
        self.ensure_built(feature_width(input.shape(), "layer")?)?;
        let op: Arc<dyn Operation> = Arc::new(TransformOp::new(Arc::clone(&self.transform)));
        let mut out = function::forward(&op, &[input.clone()])?;
        if let Some(act) = self.activation {
            out = function::forward(&act.operation(), &[out])?;
        }
        if let (Some(dropout), true) = (&self.dropout, is_training()) {
            let mask = Var::constant(dropout.mask(out.shape())?);
            out = out.mul(&mask)?;
        }
        Ok(out)
    }
}

impl<T: Transform> fmt::Debug for Layer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transform = self.transform.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Layer")
            .field("transform", &*transform)
            .field("activation", &self.activation)
            .field("dropout", &self.dropout)
            .field("pending_forward", &self.cache.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "layer_test.rs"]
mod tests;
