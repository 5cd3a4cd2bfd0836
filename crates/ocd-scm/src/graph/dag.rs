//! Directed acyclic graph over the variables of one SCM.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use ocd_core::errors::{GraphError, OcdResult};
use ocd_core::NodeId;

use super::dag_enforcement;

/// A variable in the causal graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableNode {
    pub id: NodeId,
    /// Column name in generated sample tables.
    pub name: String,
}

/// The underlying directed graph type. Nodes are never removed, so
/// `NodeIndex::index()` equals the variable id.
pub type DagGraph = DiGraph<VariableNode, ()>;

/// DAG over variables `0..n`. Acyclicity is enforced on every insertion.
#[derive(Debug, Clone)]
pub struct CausalDag {
    graph: DagGraph,
}

impl CausalDag {
    /// Create a DAG with `num_nodes` variables named `x0`, `x1`, ... and no edges.
    pub fn new(num_nodes: usize) -> Self {
        let mut graph = DiGraph::with_capacity(num_nodes, 0);
        for id in 0..num_nodes {
            graph.add_node(VariableNode {
                id,
                name: format!("x{id}"),
            });
        }
        Self { graph }
    }

    /// Build a DAG from an edge list, rejecting cycles.
    pub fn from_edges(num_nodes: usize, edges: &[(NodeId, NodeId)]) -> OcdResult<Self> {
        let mut dag = Self::new(num_nodes);
        for &(from, to) in edges {
            dag.add_edge(from, to)?;
        }
        Ok(dag)
    }

    /// Add `from → to`. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> OcdResult<()> {
        let source = self.index(from)?;
        let target = self.index(to)?;
        if self.graph.contains_edge(source, target) {
            return Ok(());
        }
        if let Some(path) = dag_enforcement::closing_path(&self.graph, source, target) {
            return Err(GraphError::CycleDetected {
                path: dag_enforcement::describe_cycle(&self.graph, source, &path),
            }
            .into());
        }
        self.graph.add_edge(source, target, ());
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All variable ids, ascending.
    pub fn nodes(&self) -> Vec<NodeId> {
        (0..self.node_count()).collect()
    }

    /// Column name of a variable.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.graph
            .node_weight(NodeIndex::new(node))
            .map(|n| n.name.as_str())
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        from < self.node_count()
            && to < self.node_count()
            && self
                .graph
                .contains_edge(NodeIndex::new(from), NodeIndex::new(to))
    }

    /// Direct causes of `node`, ascending.
    pub fn parents(&self, node: NodeId) -> OcdResult<Vec<NodeId>> {
        self.neighbors(node, Direction::Incoming)
    }

    /// Direct effects of `node`, ascending.
    pub fn children(&self, node: NodeId) -> OcdResult<Vec<NodeId>> {
        self.neighbors(node, Direction::Outgoing)
    }

    /// Every edge as `(from, to)`, sorted.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index(), b.index()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// A topological order of the variables.
    pub fn topological_order(&self) -> OcdResult<Vec<NodeId>> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(NodeIndex::index).collect())
            .map_err(|cycle| {
                GraphError::CycleDetected {
                    path: format!("through {}", cycle.node_id().index()),
                }
                .into()
            })
    }

    /// Number of edges that point backwards under `ordering`.
    ///
    /// `ordering` lists variables first to last. An ordering with zero
    /// backward edges is consistent with the DAG.
    pub fn backward_edge_count(&self, ordering: &[NodeId]) -> OcdResult<usize> {
        let n = self.node_count();
        let mut position = vec![usize::MAX; n];
        for (pos, &node) in ordering.iter().enumerate() {
            if node >= n {
                return Err(GraphError::UnknownNode {
                    node,
                    node_count: n,
                }
                .into());
            }
            position[node] = pos;
        }
        if position.contains(&usize::MAX) || ordering.len() != n {
            return Err(ocd_core::errors::ShapeError::Mismatch {
                context: "ordering".into(),
                expected: format!("a permutation of {n} variables"),
                actual: format!("{ordering:?}"),
            }
            .into());
        }
        Ok(self
            .edges()
            .into_iter()
            .filter(|&(from, to)| position[from] > position[to])
            .count())
    }

    /// Whether `ordering` places every cause before its effects.
    pub fn is_consistent_ordering(&self, ordering: &[NodeId]) -> OcdResult<bool> {
        Ok(self.backward_edge_count(ordering)? == 0)
    }

    /// Borrow the petgraph structure.
    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    fn index(&self, node: NodeId) -> OcdResult<NodeIndex> {
        if node < self.node_count() {
            Ok(NodeIndex::new(node))
        } else {
            Err(GraphError::UnknownNode {
                node,
                node_count: self.node_count(),
            }
            .into())
        }
    }

    fn neighbors(&self, node: NodeId, direction: Direction) -> OcdResult<Vec<NodeId>> {
        let idx = self.index(node)?;
        let mut out: Vec<_> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(NodeIndex::index)
            .collect();
        out.sort_unstable();
        Ok(out)
    }
}
