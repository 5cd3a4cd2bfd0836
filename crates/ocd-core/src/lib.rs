//! # ocd-core
//!
//! Foundation crate for ordering-based causal discovery.
//! Defines errors, config, defaults, and tracing setup.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod observability;

/// Identifier of a variable (node) in a causal graph.
///
/// Variables are numbered `0..n` in the order the generator created them;
/// the same id indexes the sample table column.
pub type NodeId = usize;

// Re-export the most commonly used types at the crate root.
pub use config::OcdConfig;
pub use errors::{OcdError, OcdResult};
