//! Acyclicity checks run before an edge is inserted.

use petgraph::algo::{astar, tarjan_scc};
use petgraph::graph::NodeIndex;

use super::dag::DagGraph;

/// The existing path `target -> ... -> source` that the edge
/// `source -> target` would close into a cycle, shortest first.
///
/// A self-loop closes on itself and yields `[source]`.
pub fn closing_path(graph: &DagGraph, source: NodeIndex, target: NodeIndex) -> Option<Vec<NodeIndex>> {
    if source == target {
        return Some(vec![source]);
    }
    astar(graph, target, |n| n == source, |_| 1_usize, |_| 0).map(|(_, path)| path)
}

/// Strongly connected components with more than one variable. Empty for a DAG.
pub fn find_cycles(graph: &DagGraph) -> Vec<Vec<NodeIndex>> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .collect()
}

/// `x0 -> x2 -> x0` style rendering of a closing path plus the rejected edge.
pub fn describe_cycle(graph: &DagGraph, source: NodeIndex, path: &[NodeIndex]) -> String {
    let name = |n: NodeIndex| {
        graph
            .node_weight(n)
            .map_or_else(|| n.index().to_string(), |v| v.name.clone())
    };
    std::iter::once(source)
        .chain(path.iter().copied().filter(|&n| n != source))
        .chain(std::iter::once(source))
        .map(name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CausalDag;

    #[test]
    fn closing_path_walks_from_target_back_to_source() {
        let dag = CausalDag::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
        let path = closing_path(dag.graph(), NodeIndex::new(2), NodeIndex::new(0)).unwrap();
        assert_eq!(path, vec![NodeIndex::new(0), NodeIndex::new(1), NodeIndex::new(2)]);
        assert_eq!(
            describe_cycle(dag.graph(), NodeIndex::new(2), &path),
            "x2 -> x0 -> x1 -> x2"
        );
        assert!(closing_path(dag.graph(), NodeIndex::new(0), NodeIndex::new(2)).is_none());
    }

    #[test]
    fn self_loop_is_its_own_cycle() {
        let dag = CausalDag::new(2);
        let path = closing_path(dag.graph(), NodeIndex::new(1), NodeIndex::new(1)).unwrap();
        assert_eq!(describe_cycle(dag.graph(), NodeIndex::new(1), &path), "x1 -> x1");
    }
}
