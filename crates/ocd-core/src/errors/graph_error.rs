/// Causal graph errors.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("cycle detected in causal graph: {path}")]
    CycleDetected { path: String },

    #[error("unknown node {node} (graph has {node_count} nodes)")]
    UnknownNode { node: usize, node_count: usize },
}
