use super::graph::{Graph, NodeId};
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::Tensor;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) enum Origin {
    Constant,
    Param { param: Parameter, version: u64 },
    Node { graph: Graph, id: NodeId },
}

/// A value tagged with its provenance.
///
/// A `Var` is either a constant (no gradient flows into it), a snapshot of a
/// [`Parameter`], or the output of a recorded operation node. Operations take and
/// return `Var`s; calling [`backward`](Var::backward) on a scalar loss propagates
/// gradients to every parameter it depends on.
#[derive(Clone)]
pub struct Var {
    value: Arc<Tensor>,
    pub(crate) origin: Origin,
}

impl Var {
    /// Wraps a tensor that takes no part in gradient computation.
    pub fn constant(value: Tensor) -> Self {
        Var {
            value: Arc::new(value),
            origin: Origin::Constant,
        }
    }

    /// The current value of `param`, as an input that receives gradients.
    pub fn param(param: &Parameter) -> Self {
        let (value, version) = param.snapshot();
        Var {
            value,
            origin: Origin::Param {
                param: param.clone(),
                version,
            },
        }
    }

    pub(crate) fn constant_arc(value: Arc<Tensor>) -> Self {
        Var {
            value,
            origin: Origin::Constant,
        }
    }

    pub(crate) fn node(value: Arc<Tensor>, graph: Graph, id: NodeId) -> Self {
        Var {
            value,
            origin: Origin::Node { graph, id },
        }
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub(crate) fn value_arc(&self) -> Arc<Tensor> {
        Arc::clone(&self.value)
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// The single element of a one-element value.
    pub fn item(&self) -> Result<f64> {
        self.value.item()
    }

    /// Whether gradients can flow through this value.
    pub fn is_variable(&self) -> bool {
        !matches!(self.origin, Origin::Constant)
    }

    /// The parameter this value was taken from, if any.
    pub fn parameter(&self) -> Option<&Parameter> {
        match &self.origin {
            Origin::Param { param, .. } => Some(param),
            _ => None,
        }
    }

    /// The graph holding this value's node, if any, after following merges.
    pub fn graph(&self) -> Option<Graph> {
        self.node_ref().map(|(graph, _)| graph)
    }

    /// Resolved graph and node id of a recorded value.
    pub(crate) fn node_ref(&self) -> Option<(Graph, NodeId)> {
        match &self.origin {
            Origin::Node { graph, id } => Some(graph.resolve(*id)),
            _ => None,
        }
    }

    /// Same value, cut from any graph.
    pub fn detach(&self) -> Var {
        Var {
            value: Arc::clone(&self.value),
            origin: Origin::Constant,
        }
    }

    /// Backpropagates from a scalar value with an implicit gradient of 1.
    ///
    /// # Returns
    /// The parameters that received a gradient.
    ///
    /// # Errors
    /// `BackwardNonScalar` if the value has more than one element, plus any error of
    /// [`backward_with_grad`](Var::backward_with_grad).
    pub fn backward(&self) -> Result<Vec<Parameter>> {
        if self.value.numel() != 1 {
            return Err(ToychError::BackwardNonScalar {
                shape: self.value.shape().to_vec(),
            });
        }
        self.backward_with_grad(crate::tensor::ones(self.value.shape()))
    }

    /// Backpropagates `grad` (dL/dself) through the graph that produced this value.
    ///
    /// On success every contributing parameter has the gradient added to its slot and
    /// the graph is consumed. On error nothing is modified. Calling this on a constant
    /// does nothing.
    ///
    /// # Errors
    /// `ShapeMismatch` if `grad` does not have this value's shape, `GraphConsumed` on a
    /// second call for the same graph, `StaleGraph` if a captured parameter changed.
    pub fn backward_with_grad(&self, grad: Tensor) -> Result<Vec<Parameter>> {
        if grad.shape() != self.value.shape() {
            return Err(ToychError::ShapeMismatch {
                expected: self.value.shape().to_vec(),
                actual: grad.shape().to_vec(),
                operation: "backward".to_string(),
            });
        }
        match &self.origin {
            Origin::Constant => {
                log::debug!("backward on a constant value, nothing to do");
                Ok(Vec::new())
            }
            Origin::Param { param, version } => {
                if param.version() != *version {
                    return Err(ToychError::StaleGraph {
                        parameter: param.label(),
                        recorded: *version,
                        current: param.version(),
                    });
                }
                param.accumulate_grad(&grad)?;
                Ok(vec![param.clone()])
            }
            Origin::Node { graph, id } => {
                let (graph, id) = graph.resolve(*id);
                super::backward::run_backward(&graph, id, grad)
            }
        }
    }
}

impl From<Tensor> for Var {
    fn from(value: Tensor) -> Self {
        Var::constant(value)
    }
}

impl From<&Parameter> for Var {
    fn from(param: &Parameter) -> Self {
        Var::param(param)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = match &self.origin {
            Origin::Constant => "constant".to_string(),
            Origin::Param { param, .. } => param.label(),
            Origin::Node { id, .. } => format!("node {}", id),
        };
        f.debug_struct("Var")
            .field("origin", &origin)
            .field("value", &self.value)
            .finish()
    }
}
