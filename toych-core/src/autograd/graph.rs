use super::backward_op::Operation;
use crate::error::{Result, ToychError};
use crate::nn::{ParamId, Parameter};
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Index of a node in its graph's arena.
pub type NodeId = usize;

pub(crate) enum NodeKind {
    /// A parameter entering the graph. One per parameter per graph.
    Leaf { param: Parameter, version: u64 },
    /// One recorded call of an operation.
    Op {
        op: Arc<dyn Operation>,
        /// `None` marks a constant argument.
        inputs: Vec<Option<NodeId>>,
        saved: Vec<Arc<Tensor>>,
        param_versions: Vec<(Parameter, u64)>,
    },
}

pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) output: Arc<Tensor>,
}

#[derive(Default)]
pub(crate) struct GraphData {
    pub(crate) nodes: Vec<Node>,
    pub(crate) leaves: HashMap<ParamId, NodeId>,
    pub(crate) consumed: bool,
    /// Set once the nodes were moved into another graph: that graph and the new id
    /// of every old node.
    merged_into: Option<(Graph, Vec<NodeId>)>,
}

impl GraphData {
    /// Releases every node; the graph can no longer record or run backward.
    pub(crate) fn consume(&mut self) {
        self.consumed = true;
        self.nodes.clear();
        self.leaves.clear();
    }
}

/// A computation graph: an append-only arena of nodes shared by every [`Var`](super::Var)
/// recorded into it.
///
/// Edges always point from a node to nodes with smaller ids, so the graph is acyclic
/// by construction. A graph supports exactly one backward pass; afterwards it is
/// consumed and its nodes are released.
///
/// Independent branches start separate graphs (e.g. two layers applied to the same
/// constant input). When an operation combines them, the later graph is absorbed
/// into the earlier one and handles to it are forwarded.
#[derive(Clone)]
pub struct Graph {
    data: Arc<RwLock<GraphData>>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Graph {
            data: Arc::new(RwLock::new(GraphData::default())),
        }
    }

    pub(crate) fn read_data(&self) -> RwLockReadGuard<'_, GraphData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_data(&self) -> RwLockWriteGuard<'_, GraphData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles refer to the same graph.
    pub fn same_graph(&self, other: &Graph) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of recorded nodes (0 once consumed).
    pub fn len(&self) -> usize {
        self.read_data().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_consumed(&self) -> bool {
        let (graph, _) = self.resolve(0);
        let consumed = graph.read_data().consumed;
        consumed
    }

    /// Follows merges to the graph that now holds node `id`, and its id there.
    pub(crate) fn resolve(&self, id: NodeId) -> (Graph, NodeId) {
        let mut graph = self.clone();
        let mut id = id;
        loop {
            let next = {
                let data = graph.read_data();
                match &data.merged_into {
                    Some((target, remap)) => Some((target.clone(), remap.get(id).copied().unwrap_or(id))),
                    None => None,
                }
            };
            match next {
                Some((target, new_id)) => {
                    graph = target;
                    id = new_id;
                }
                None => return (graph, id),
            }
        }
    }

    /// Moves every node of `other` into this graph.
    ///
    /// Leaves of parameters already present here are shared; the rest are appended with
    /// their edges renumbered. `other` keeps a forwarding record so existing handles
    /// resolve to the moved nodes.
    ///
    /// # Errors
    /// `GraphConsumed` if either graph already ran backward, `StaleGraph` if both
    /// captured the same parameter at different versions. Nothing moves on error.
    pub(crate) fn absorb(&self, other: &Graph) -> Result<()> {
        if self.same_graph(other) {
            return Ok(());
        }
        // Fixed lock order between the two graphs.
        let self_first = Arc::as_ptr(&self.data) < Arc::as_ptr(&other.data);
        let (mut dst, mut src) = if self_first {
            let dst = self.write_data();
            (dst, other.write_data())
        } else {
            let src = other.write_data();
            (self.write_data(), src)
        };
        if dst.consumed || src.consumed {
            return Err(ToychError::GraphConsumed);
        }
        for node in &src.nodes {
            if let NodeKind::Leaf { param, version } = &node.kind {
                if let Some(&existing) = dst.leaves.get(&param.id()) {
                    if let NodeKind::Leaf { version: kept, .. } = dst.nodes[existing].kind {
                        if kept != *version {
                            return Err(ToychError::StaleGraph {
                                parameter: param.label(),
                                recorded: kept,
                                current: *version,
                            });
                        }
                    }
                }
            }
        }

        let moved = std::mem::take(&mut src.nodes);
        let mut remap: Vec<NodeId> = Vec::with_capacity(moved.len());
        for node in moved {
            let kind = match node.kind {
                NodeKind::Leaf { param, version } => {
                    if let Some(&existing) = dst.leaves.get(&param.id()) {
                        remap.push(existing);
                        continue;
                    }
                    let id = dst.nodes.len();
                    dst.leaves.insert(param.id(), id);
                    NodeKind::Leaf { param, version }
                }
                NodeKind::Op {
                    op,
                    inputs,
                    saved,
                    param_versions,
                } => NodeKind::Op {
                    op,
                    inputs: inputs
                        .into_iter()
                        .map(|edge| edge.and_then(|i| remap.get(i).copied()))
                        .collect(),
                    saved,
                    param_versions,
                },
            };
            let id = dst.nodes.len();
            remap.push(id);
            dst.nodes.push(Node {
                kind,
                output: node.output,
            });
        }
        log::debug!("Merged {} node(s) into a graph of {}", remap.len(), dst.nodes.len());
        src.leaves.clear();
        src.merged_into = Some((self.clone(), remap));
        Ok(())
    }

    /// Returns the leaf node of `param`, creating it on first use.
    ///
    /// `value` is the snapshot taken at `version`.
    ///
    /// # Errors
    /// `GraphConsumed` after backward; `StaleGraph` if the parameter changed since the
    /// snapshot was taken or since its leaf was recorded earlier in this graph.
    pub(crate) fn leaf(&self, param: &Parameter, value: Arc<Tensor>, version: u64) -> Result<NodeId> {
        let mut data = self.write_data();
        if data.consumed {
            return Err(ToychError::GraphConsumed);
        }
        let current = param.version();
        if current != version {
            return Err(ToychError::StaleGraph {
                parameter: param.label(),
                recorded: version,
                current,
            });
        }
        if let Some(&id) = data.leaves.get(&param.id()) {
            if let NodeKind::Leaf { version: recorded, .. } = data.nodes[id].kind {
                if recorded != version {
                    return Err(ToychError::StaleGraph {
                        parameter: param.label(),
                        recorded,
                        current: version,
                    });
                }
            }
            return Ok(id);
        }
        let id = data.nodes.len();
        data.nodes.push(Node {
            kind: NodeKind::Leaf {
                param: param.clone(),
                version,
            },
            output: value,
        });
        data.leaves.insert(param.id(), id);
        Ok(id)
    }

    /// Appends an operation node.
    pub(crate) fn record(
        &self,
        op: Arc<dyn Operation>,
        inputs: Vec<Option<NodeId>>,
        saved: Vec<Arc<Tensor>>,
        output: Arc<Tensor>,
    ) -> Result<NodeId> {
        let mut data = self.write_data();
        if data.consumed {
            return Err(ToychError::GraphConsumed);
        }
        let id = data.nodes.len();
        if let Some(bad) = inputs.iter().flatten().find(|&&i| i >= id) {
            return Err(ToychError::InternalError(format!(
                "node {} cannot depend on later node {}",
                id, bad
            )));
        }
        let param_versions = op
            .parameters()
            .into_iter()
            .map(|p| {
                let v = p.version();
                (p, v)
            })
            .collect();
        log::debug!("Recording node {} ({})", id, op.name());
        data.nodes.push(Node {
            kind: NodeKind::Op {
                op,
                inputs,
                saved,
                param_versions,
            },
            output,
        });
        Ok(id)
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.read_data();
        f.debug_struct("Graph")
            .field("nodes", &data.nodes.len())
            .field("leaves", &data.leaves.len())
            .field("consumed", &data.consumed)
            .finish()
    }
}

/// Orders the ancestors of `root` so that every node comes before the nodes it
/// depends on (root first, leaves last).
///
/// Iterative depth-first search; a node reached again while still on the DFS stack
/// means a cycle.
pub(crate) fn topological_sort(nodes: &[Node], root: NodeId) -> Result<Vec<NodeId>> {
    if root >= nodes.len() {
        return Err(ToychError::InternalError(format!(
            "root node {} not in graph of {} node(s)",
            root,
            nodes.len()
        )));
    }
    let mut post_order = Vec::new();
    let mut done: HashSet<NodeId> = HashSet::new();
    let mut on_stack: HashSet<NodeId> = HashSet::new();
    // (node, children already pushed)
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            on_stack.remove(&id);
            if done.insert(id) {
                post_order.push(id);
            }
            continue;
        }
        if done.contains(&id) {
            continue;
        }
        if !on_stack.insert(id) {
            return Err(ToychError::CycleDetected);
        }
        stack.push((id, true));
        if let NodeKind::Op { inputs, .. } = &nodes[id].kind {
            for &child in inputs.iter().flatten() {
                if child >= nodes.len() {
                    return Err(ToychError::InternalError(format!(
                        "edge to missing node {}",
                        child
                    )));
                }
                if on_stack.contains(&child) {
                    return Err(ToychError::CycleDetected);
                }
                if !done.contains(&child) {
                    stack.push((child, false));
                }
            }
        }
    }
    post_order.reverse();
    Ok(post_order)
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
