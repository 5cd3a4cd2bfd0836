pub mod dag;
pub mod dag_enforcement;

pub use dag::{CausalDag, VariableNode};
