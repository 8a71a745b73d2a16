use crate::error::{Result, ToychError};
use crate::nn::init;
use crate::tensor::Tensor;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a [`Parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(u64);

impl ParamId {
    fn next() -> Self {
        ParamId(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct ParameterData {
    pub(crate) value: Arc<Tensor>,
    pub(crate) grad: Option<Tensor>,
    pub(crate) version: u64,
    pub(crate) name: Option<String>,
}

/// A trainable tensor with identity.
///
/// Cloning a `Parameter` yields another handle to the same parameter: equality and
/// hashing go by identity, so a `Parameter` can key optimizer state or per-pass
/// gradient accumulators.
///
/// The gradient slot is lazily zero: [`grad`](Parameter::grad) returns zeros until
/// something has been accumulated, and [`has_grad`](Parameter::has_grad) tells the
/// two cases apart. Every mutation of the value bumps [`version`](Parameter::version),
/// which the backward engine uses to reject graphs recorded against an older value.
#[derive(Clone)]
pub struct Parameter {
    id: ParamId,
    data: Arc<RwLock<ParameterData>>,
}

/// Serializable snapshot of a parameter's value and gradient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterState {
    pub name: Option<String>,
    pub value: Tensor,
    pub grad: Option<Tensor>,
}

impl Parameter {
    /// Wraps an existing tensor as a parameter.
    pub fn new(value: Tensor) -> Self {
        Parameter {
            id: ParamId::next(),
            data: Arc::new(RwLock::new(ParameterData {
                value: Arc::new(value),
                grad: None,
                version: 0,
                name: None,
            })),
        }
    }

    /// Creates a parameter from an explicit value or by random draw.
    ///
    /// # Arguments
    /// * `value`: Initial value. When `shape` is also given, the value is broadcast to it.
    /// * `shape`: Shape of a randomly drawn parameter when `value` is `None`.
    /// * `mean`: Mean of the normal draw.
    /// * `scale`: Standard deviation of the normal draw, `1 / sqrt(shape[0])` by default.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when neither `value` nor `shape` is given, and
    /// `BroadcastError` when `value` cannot be broadcast to `shape`.
    pub fn create(
        value: Option<Tensor>,
        shape: Option<&[usize]>,
        mean: f64,
        scale: Option<f64>,
    ) -> Result<Self> {
        match (value, shape) {
            (Some(v), None) => Ok(Parameter::new(v)),
            (Some(v), Some(s)) => Ok(Parameter::new(v.broadcast_to(s)?)),
            (None, Some(s)) => Parameter::randn(s, mean, scale),
            (None, None) => Err(ToychError::InvalidArgument(
                "a parameter needs either a value or a shape".to_string(),
            )),
        }
    }

    /// Parameter of `shape` filled with `value`.
    pub fn full(shape: &[usize], value: f64) -> Self {
        Parameter::new(crate::tensor::full(shape, value))
    }

    /// Parameter of `shape` drawn from N(`mean`, `scale`) using the thread RNG.
    pub fn randn(shape: &[usize], mean: f64, scale: Option<f64>) -> Result<Self> {
        Parameter::randn_with_rng(shape, mean, scale, &mut rand::thread_rng())
    }

    /// Same as [`randn`](Parameter::randn) with an explicit random source.
    pub fn randn_with_rng<R: Rng + ?Sized>(
        shape: &[usize],
        mean: f64,
        scale: Option<f64>,
        rng: &mut R,
    ) -> Result<Self> {
        let std = scale.unwrap_or_else(|| init::default_scale(shape));
        Ok(Parameter::new(init::normal(shape, mean, std, rng)?))
    }

    /// Sets a human-readable name used in logs and error messages.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.write_data().name = Some(name.into());
        self
    }

    pub(crate) fn read_data(&self) -> RwLockReadGuard<'_, ParameterData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_data(&self) -> RwLockWriteGuard<'_, ParameterData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> ParamId {
        self.id
    }

    pub fn name(&self) -> Option<String> {
        self.read_data().name.clone()
    }

    /// Name if set, otherwise the identity, for messages.
    pub fn label(&self) -> String {
        self.name().unwrap_or_else(|| format!("parameter {}", self.id))
    }

    /// Current value. The returned tensor is a snapshot: later updates do not affect it.
    pub fn value(&self) -> Arc<Tensor> {
        Arc::clone(&self.read_data().value)
    }

    /// Value and version read under one lock.
    pub(crate) fn snapshot(&self) -> (Arc<Tensor>, u64) {
        let guard = self.read_data();
        (Arc::clone(&guard.value), guard.version)
    }

    pub fn shape(&self) -> Vec<usize> {
        self.read_data().value.shape().to_vec()
    }

    /// Number of value mutations since creation.
    pub fn version(&self) -> u64 {
        self.read_data().version
    }

    /// Accumulated gradient, zeros of the parameter's shape if nothing was accumulated.
    pub fn grad(&self) -> Tensor {
        let guard = self.read_data();
        match &guard.grad {
            Some(g) => g.clone(),
            None => crate::tensor::zeros_like(&guard.value),
        }
    }

    /// Whether a gradient was accumulated since the last [`zero_grad`](Parameter::zero_grad).
    pub fn has_grad(&self) -> bool {
        self.read_data().grad.is_some()
    }

    /// Adds `grad` into the gradient slot.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `grad` does not have the parameter's shape.
    pub fn accumulate_grad(&self, grad: &Tensor) -> Result<()> {
        let mut guard = self.write_data();
        if grad.shape() != guard.value.shape() {
            return Err(ToychError::ShapeMismatch {
                expected: guard.value.shape().to_vec(),
                actual: grad.shape().to_vec(),
                operation: format!("accumulate_grad({})", self.id),
            });
        }
        match guard.grad.as_mut() {
            Some(acc) => acc.add_assign(grad)?,
            None => guard.grad = Some(grad.clone()),
        }
        Ok(())
    }

    /// Clears the gradient slot. Idempotent.
    pub fn zero_grad(&self) {
        self.write_data().grad = None;
    }

    /// Mutates the value in place and bumps the version.
    ///
    /// The closure must keep the shape; a shape change is rejected and the old value kept.
    pub fn update_value<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Tensor) -> Result<()>,
    {
        let mut guard = self.write_data();
        let mut next = (*guard.value).clone();
        f(&mut next)?;
        if next.shape() != guard.value.shape() {
            return Err(ToychError::ShapeMismatch {
                expected: guard.value.shape().to_vec(),
                actual: next.shape().to_vec(),
                operation: format!("update_value({})", self.id),
            });
        }
        guard.value = Arc::new(next);
        guard.version += 1;
        Ok(())
    }

    /// Replaces the value, keeping the shape.
    pub fn set_value(&self, value: Tensor) -> Result<()> {
        self.update_value(|v| {
            *v = value;
            Ok(())
        })
    }

    /// `value += delta`.
    pub fn add_to_value(&self, delta: &Tensor) -> Result<()> {
        self.update_value(|v| v.add_assign(delta))
    }

    /// Snapshot of value and gradient state.
    pub fn state(&self) -> ParameterState {
        let guard = self.read_data();
        ParameterState {
            name: guard.name.clone(),
            value: (*guard.value).clone(),
            grad: guard.grad.clone(),
        }
    }

    /// Rebuilds a parameter from a snapshot. The result is a new identity.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the stored gradient does not match the stored value.
    pub fn from_state(state: ParameterState) -> Result<Self> {
        if let Some(g) = &state.grad {
            if g.shape() != state.value.shape() {
                return Err(ToychError::ShapeMismatch {
                    expected: state.value.shape().to_vec(),
                    actual: g.shape().to_vec(),
                    operation: "Parameter::from_state".to_string(),
                });
            }
        }
        let param = Parameter::new(state.value);
        {
            let mut guard = param.write_data();
            guard.grad = state.grad;
            guard.name = state.name;
        }
        Ok(param)
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.read_data();
        f.debug_struct("Parameter")
            .field("id", &self.id)
            .field("name", &guard.name)
            .field("shape", &guard.value.shape())
            .field("version", &guard.version)
            .field("has_grad", &guard.grad.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "parameter_test.rs"]
mod tests;
