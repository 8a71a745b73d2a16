use thiserror::Error;

/// Custom error type for the toych framework.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ToychError {
    /// Malformed construction parameters (e.g. a parameter with neither a value nor a shape).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was called with the wrong number of inputs.
    #[error("Operation {operation} expects {expected} input(s), got {actual}")]
    ArgumentError {
        operation: String,
        expected: usize,
        actual: usize,
    },

    /// A transform was used before `setup` gave it its parameters.
    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Cannot broadcast shapes: {shape1:?} and {shape2:?}")]
    BroadcastError {
        shape1: Vec<usize>,
        shape2: Vec<usize>,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Index out of bounds: index {index:?} for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Backward called on non-scalar output of shape {shape:?} without explicit gradient")]
    BackwardNonScalar { shape: Vec<usize> },

    /// The graph already ran its backward pass and released its nodes.
    #[error("Computation graph was already consumed by a backward pass")]
    GraphConsumed,

    /// A parameter captured by the graph was modified before backward ran.
    #[error("Parameter {parameter} changed since it was recorded (version {recorded}, now {current})")]
    StaleGraph {
        parameter: String,
        recorded: u64,
        current: u64,
    },

    #[error("Cycle detected in the computation graph")]
    CycleDetected,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ToychError>;
