mod config_error;
mod graph_error;
mod shape_error;
mod sizing_error;

pub use config_error::ConfigError;
pub use graph_error::GraphError;
pub use shape_error::ShapeError;
pub use sizing_error::SizingError;

/// Top-level error for every operation in the workspace.
///
/// None of these are retried locally; they all propagate to whoever drives
/// the run.
#[derive(Debug, thiserror::Error)]
pub enum OcdError {
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("sizing error: {0}")]
    SizingError(#[from] SizingError),

    #[error("stage `{stage}` is not supported")]
    UnsupportedStage { stage: String },

    #[error("shape error: {0}")]
    ShapeError(#[from] ShapeError),

    #[error("graph error: {0}")]
    GraphError(#[from] GraphError),
}

pub type OcdResult<T> = Result<T, OcdError>;
