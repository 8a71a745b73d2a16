use super::backward_op::{BackwardContext, ParamStaging};
use super::graph::{topological_sort, Graph, NodeId, NodeKind};
use crate::error::{Result, ToychError};
use crate::nn::Parameter;
use crate::tensor::Tensor;
use std::collections::HashMap;

fn check_version(param: &Parameter, recorded: u64) -> Result<()> {
    let current = param.version();
    if current != recorded {
        return Err(ToychError::StaleGraph {
            parameter: param.label(),
            recorded,
            current,
        });
    }
    Ok(())
}

/// Runs the single backward pass of `graph` from `root`, seeded with `grad_root`.
///
/// Nodes are visited in topological order, so a node's gradient is complete (every
/// fan-out contribution summed) before its operation's backward rule runs. All
/// contributions to parameters go through a [`ParamStaging`] and are committed only
/// after the traversal succeeded; on success the graph is consumed.
pub(crate) fn run_backward(graph: &Graph, root: NodeId, grad_root: Tensor) -> Result<Vec<Parameter>> {
    let mut data = graph.write_data();
    if data.consumed {
        return Err(ToychError::GraphConsumed);
    }
    let order = topological_sort(&data.nodes, root)?;
    log::debug!("Backward from node {} over {} node(s)", root, order.len());

    let mut pending: HashMap<NodeId, Tensor> = HashMap::new();
    pending.insert(root, grad_root);
    let mut staging = ParamStaging::default();

    for id in order {
        let Some(grad) = pending.remove(&id) else {
            continue;
        };
        let node = &data.nodes[id];
        if grad.shape() != node.output.shape() {
            return Err(ToychError::ShapeMismatch {
                expected: node.output.shape().to_vec(),
                actual: grad.shape().to_vec(),
                operation: format!("gradient of node {}", id),
            });
        }
        match &node.kind {
            NodeKind::Leaf { param, version } => {
                check_version(param, *version)?;
                staging.accumulate(param, grad)?;
            }
            NodeKind::Op {
                op,
                inputs,
                saved,
                param_versions,
            } => {
                for (param, version) in param_versions {
                    check_version(param, *version)?;
                }
                let needs_grad: Vec<bool> = inputs.iter().map(Option::is_some).collect();
                let input_grads = {
                    let mut ctx = BackwardContext::new(saved, &node.output, &needs_grad, &mut staging);
                    op.backward(&mut ctx, &grad)?
                };
                if input_grads.len() != inputs.len() {
                    return Err(ToychError::InternalError(format!(
                        "{} returned {} gradient(s) for {} input(s)",
                        op.name(),
                        input_grads.len(),
                        inputs.len()
                    )));
                }
                for ((slot, input_grad), input) in inputs.iter().zip(input_grads).zip(saved) {
                    let (Some(input_id), Some(input_grad)) = (slot, input_grad) else {
                        continue;
                    };
                    if input_grad.shape() != input.shape() {
                        return Err(ToychError::ShapeMismatch {
                            expected: input.shape().to_vec(),
                            actual: input_grad.shape().to_vec(),
                            operation: format!("{} backward", op.name()),
                        });
                    }
                    match pending.get_mut(input_id) {
                        Some(acc) => acc.add_assign(&input_grad)?,
                        None => {
                            pending.insert(*input_id, input_grad);
                        }
                    }
                }
            }
        }
    }

    let params = staging.commit()?;
    data.consume();
    Ok(params)
}

#[cfg(test)]
#[path = "backward_test.rs"]
mod tests;
