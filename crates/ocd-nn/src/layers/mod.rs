//! Layer building blocks.

pub mod activation;
pub mod batch_norm;
pub mod dropout;
pub mod masked_block;
pub mod masked_linear;
pub mod masked_mlp;

pub use activation::Activation;
pub use batch_norm::BatchNorm1d;
pub use dropout::Dropout;
pub use masked_block::MaskedBlock;
pub use masked_linear::MaskedLinear;
pub use masked_mlp::MaskedMlp;
