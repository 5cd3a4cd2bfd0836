use serde::{Deserialize, Serialize};

use super::defaults;

/// Feature layout of a masked layer side.
///
/// `Flat(n)` is `n` blocks of one feature each; `Blocks(sizes)` is one block
/// per entry, each with its own width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Features {
    Flat(usize),
    Blocks(Vec<usize>),
}

impl Features {
    /// Number of blocks.
    pub fn blocks(&self) -> usize {
        match self {
            Features::Flat(n) => *n,
            Features::Blocks(sizes) => sizes.len(),
        }
    }

    /// Total number of features.
    pub fn width(&self) -> usize {
        match self {
            Features::Flat(n) => *n,
            Features::Blocks(sizes) => sizes.iter().sum(),
        }
    }

    /// Width of every block, in order.
    pub fn block_sizes(&self) -> Vec<usize> {
        match self {
            Features::Flat(n) => vec![1; *n],
            Features::Blocks(sizes) => sizes.clone(),
        }
    }

    /// Whether every block has at least one feature.
    pub fn is_valid(&self) -> bool {
        match self {
            Features::Flat(n) => *n > 0,
            Features::Blocks(sizes) => !sizes.is_empty() && sizes.iter().all(|&s| s > 0),
        }
    }
}

impl From<usize> for Features {
    fn from(n: usize) -> Self {
        Features::Flat(n)
    }
}

impl From<Vec<usize>> for Features {
    fn from(sizes: Vec<usize>) -> Self {
        Features::Blocks(sizes)
    }
}

/// How a relaxed permutation is turned into a connectivity mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaskPolicy {
    /// Keep the continuous mask values (differentiable in the permutation).
    #[default]
    Soft,
    /// Threshold at 0.5 into a {0, 1} mask.
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchNormArgs {
    pub eps: f64,
    pub momentum: f64,
    /// Learnable scale and shift.
    pub affine: bool,
}

impl Default for BatchNormArgs {
    fn default() -> Self {
        Self {
            eps: defaults::DEFAULT_BATCH_NORM_EPS,
            momentum: defaults::DEFAULT_BATCH_NORM_MOMENTUM,
            affine: true,
        }
    }
}

/// Construction parameters of a single masked block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskedBlockConfig {
    pub in_features: Features,
    pub out_features: Features,
    pub bias: bool,
    pub elementwise_perm: bool,
    pub residual: bool,
    /// Activation registry key, e.g. "relu" or "leaky_relu".
    pub activation: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub activation_args: serde_json::Value,
    pub batch_norm: bool,
    pub batch_norm_args: BatchNormArgs,
    /// Dropout probability; zero disables it.
    pub dropout: f64,
    pub auto_connection: bool,
    pub reversed_ordering: bool,
    pub mask_policy: MaskPolicy,
    /// Seed for weight init and dropout.
    pub seed: u64,
}

impl Default for MaskedBlockConfig {
    fn default() -> Self {
        Self {
            in_features: Features::Flat(1),
            out_features: Features::Flat(1),
            bias: defaults::DEFAULT_BIAS,
            elementwise_perm: defaults::DEFAULT_ELEMENTWISE_PERM,
            residual: false,
            activation: None,
            activation_args: serde_json::Value::Null,
            batch_norm: false,
            batch_norm_args: BatchNormArgs::default(),
            dropout: defaults::DEFAULT_DROPOUT,
            auto_connection: defaults::DEFAULT_AUTO_CONNECTION,
            reversed_ordering: defaults::DEFAULT_REVERSED_ORDERING,
            mask_policy: MaskPolicy::default(),
            seed: defaults::DEFAULT_SEED,
        }
    }
}

impl MaskedBlockConfig {
    pub fn new(in_features: impl Into<Features>, out_features: impl Into<Features>) -> Self {
        Self {
            in_features: in_features.into(),
            out_features: out_features.into(),
            ..Self::default()
        }
    }
}

/// A stack of masked blocks: hidden blocks share the post-processing knobs,
/// the output block is a plain masked linear map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskedMlpConfig {
    pub in_features: Features,
    pub hidden_features: Vec<Features>,
    pub out_features: Features,
    pub bias: bool,
    pub elementwise_perm: bool,
    pub residual: bool,
    pub activation: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub activation_args: serde_json::Value,
    pub batch_norm: bool,
    pub batch_norm_args: BatchNormArgs,
    pub dropout: f64,
    /// Applies to hidden blocks; the output block never self-connects.
    pub auto_connection: bool,
    pub reversed_ordering: bool,
    pub mask_policy: MaskPolicy,
    pub seed: u64,
}

impl Default for MaskedMlpConfig {
    fn default() -> Self {
        Self {
            in_features: Features::Flat(1),
            hidden_features: Vec::new(),
            out_features: Features::Flat(1),
            bias: defaults::DEFAULT_BIAS,
            elementwise_perm: defaults::DEFAULT_ELEMENTWISE_PERM,
            residual: false,
            activation: Some("leaky_relu".to_string()),
            activation_args: serde_json::Value::Null,
            batch_norm: false,
            batch_norm_args: BatchNormArgs::default(),
            dropout: defaults::DEFAULT_DROPOUT,
            auto_connection: defaults::DEFAULT_AUTO_CONNECTION,
            reversed_ordering: defaults::DEFAULT_REVERSED_ORDERING,
            mask_policy: MaskPolicy::default(),
            seed: defaults::DEFAULT_SEED,
        }
    }
}
