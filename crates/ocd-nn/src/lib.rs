//! # ocd-nn
//!
//! Layers whose connectivity is gated by a variable ordering supplied on
//! every forward pass. Output unit `i` only sees inputs ordered before `i`
//! (or at `i`, with auto-connection), which keeps the learned function
//! consistent with some DAG.

pub mod layers;
pub mod module;
pub mod permutation;

pub use layers::{Activation, BatchNorm1d, Dropout, MaskedBlock, MaskedLinear, MaskedMlp};
pub use module::PermutationModule;
pub use ocd_core::config::{Features, MaskPolicy};
pub use permutation::Perm;
