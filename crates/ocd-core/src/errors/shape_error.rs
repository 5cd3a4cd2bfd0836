/// Tensor or permutation shapes that do not line up.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("{context}: expected {expected}, got {actual}")]
    Mismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("permutation matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("{blocks} blocks cannot be grouped over {variables} variables")]
    BlockGrouping { blocks: usize, variables: usize },

    #[error("{context}: features must be non-empty and positive")]
    EmptyFeatures { context: String },
}
