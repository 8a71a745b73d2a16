use super::backward_op::Operation;
use super::graph::Graph;
use super::mode::is_training;
use super::var::{Origin, Var};
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use std::sync::Arc;

/// Callable handle around an [`Operation`], optionally with some arguments bound.
///
/// Calling a `Function` evaluates the operation and, in training mode, records a node
/// in the graph its variable arguments belong to.
///
/// # Example
/// ```
/// use toych_core::autograd::{Function, Var};
/// use toych_core::nn::Parameter;
/// use toych_core::ops::arithmetic::Add;
/// use toych_core::tensor::Tensor;
///
/// let w = Parameter::new(Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap());
/// let shift = Function::new(Add).bind(1, Var::param(&w)).unwrap();
/// let y = shift.call(&[Var::constant(toych_core::tensor::scalar(2.0))]).unwrap();
/// assert_eq!(y.value().data(), &[3.0, 4.0, 5.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Function {
    op: Arc<dyn Operation>,
    bound: Vec<Option<Var>>,
}

impl Function {
    pub fn new<O: Operation + 'static>(op: O) -> Self {
        Function::from_arc(Arc::new(op))
    }

    pub fn from_arc(op: Arc<dyn Operation>) -> Self {
        let bound = vec![None; op.arity()];
        Function { op, bound }
    }

    pub fn name(&self) -> &str {
        self.op.name()
    }

    pub fn operation(&self) -> &Arc<dyn Operation> {
        &self.op
    }

    /// Number of arguments still expected by [`call`](Function::call).
    pub fn arity(&self) -> usize {
        self.bound.iter().filter(|b| b.is_none()).count()
    }

    /// Parameters this function reaches without being passed them: bound parameters
    /// and those owned by the operation.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params: Vec<Parameter> = self
            .bound
            .iter()
            .flatten()
            .filter_map(|v| v.parameter().cloned())
            .collect();
        for p in self.op.parameters() {
            if !params.contains(&p) {
                params.push(p);
            }
        }
        params
    }

    /// Partial application: fixes argument `position` (counted over all of the
    /// operation's arguments) to `value`.
    ///
    /// A bound parameter is re-read at every call, so optimizer updates are seen and
    /// gradients still reach it.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `position` is out of range or already bound.
    pub fn bind(&self, position: usize, value: Var) -> Result<Function> {
        match self.bound.get(position) {
            None => Err(ToychError::InvalidArgument(format!(
                "{} has {} argument(s), cannot bind position {}",
                self.op.name(),
                self.bound.len(),
                position
            ))),
            Some(Some(_)) => Err(ToychError::InvalidArgument(format!(
                "argument {} of {} is already bound",
                position,
                self.op.name()
            ))),
            Some(None) => {
                let mut bound = self.bound.clone();
                bound[position] = Some(value);
                Ok(Function {
                    op: Arc::clone(&self.op),
                    bound,
                })
            }
        }
    }

    /// Applies the operation to `inputs` (the unbound arguments, in order).
    ///
    /// # Errors
    /// `ArgumentError` on a wrong number of inputs, `GraphConsumed` if an input comes
    /// from a consumed graph, `StaleGraph` if inputs from different graphs captured one
    /// parameter at different versions, and whatever the operation itself reports.
    pub fn call(&self, inputs: &[Var]) -> Result<Var> {
        if inputs.len() != self.arity() {
            return Err(ToychError::ArgumentError {
                operation: self.op.name().to_string(),
                expected: self.arity(),
                actual: inputs.len(),
            });
        }
        let mut free = inputs.iter();
        let mut args = Vec::with_capacity(self.bound.len());
        for slot in &self.bound {
            let arg = match slot {
                Some(bound) => match bound.parameter() {
                    Some(p) => Var::param(p),
                    None => bound.clone(),
                },
                None => free.next().cloned().ok_or_else(|| {
                    ToychError::InternalError("ran out of call arguments".to_string())
                })?,
            };
            args.push(arg);
        }
        forward(&self.op, &args)
    }
}

/// Evaluates `op` on `args` and records the call when gradients are needed.
pub(crate) fn forward(op: &Arc<dyn Operation>, args: &[Var]) -> Result<Var> {
    if args.len() != op.arity() {
        return Err(ToychError::ArgumentError {
            operation: op.name().to_string(),
            expected: op.arity(),
            actual: args.len(),
        });
    }
    let values: Vec<&crate::tensor::Tensor> = args.iter().map(Var::value).collect();
    let output = Arc::new(op.apply(&values)?);

    let wants_graph = args.iter().any(Var::is_variable) || !op.parameters().is_empty();
    if !is_training() || !wants_graph {
        return Ok(Var::constant_arc(output));
    }

    let graph = shared_graph(args)?;
    let edges = args
        .iter()
        .map(|arg| match &arg.origin {
            Origin::Constant => Ok(None),
            Origin::Param { param, version } => graph.leaf(param, arg.value_arc(), *version).map(Some),
            Origin::Node { .. } => Ok(arg.node_ref().map(|(_, id)| id)),
        })
        .collect::<Result<Vec<_>>>()?;
    let saved = args.iter().map(Var::value_arc).collect();
    let id = graph.record(Arc::clone(op), edges, saved, Arc::clone(&output))?;
    Ok(Var::node(output, graph, id))
}

/// The graph every argument belongs to: the first argument's graph with the others
/// merged into it, or a fresh one when no argument was recorded.
fn shared_graph(args: &[Var]) -> Result<Graph> {
    let mut graphs = args.iter().filter_map(Var::graph);
    let Some(target) = graphs.next() else {
        return Ok(Graph::new());
    };
    if target.is_consumed() {
        return Err(ToychError::GraphConsumed);
    }
    for other in graphs {
        target.absorb(&other)?;
    }
    Ok(target)
}

#[cfg(test)]
#[path = "function_test.rs"]
mod tests;
