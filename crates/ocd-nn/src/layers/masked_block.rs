use ndarray::{Array2, ArrayView2};
use tracing::warn;

use ocd_core::config::MaskedBlockConfig;
use ocd_core::errors::{OcdResult, ShapeError};

use super::{Activation, BatchNorm1d, Dropout, MaskedLinear};
use crate::module::PermutationModule;
use crate::permutation::Perm;

/// Masked linear, then batch norm, activation and dropout when configured,
/// then a residual connection when input and output have the same blocks.
#[derive(Debug)]
pub struct MaskedBlock {
    linear: MaskedLinear,
    batch_norm: Option<BatchNorm1d>,
    activation: Option<Activation>,
    dropout: Option<Dropout>,
    residual: bool,
}

impl MaskedBlock {
    pub fn from_config(config: &MaskedBlockConfig) -> OcdResult<Self> {
        let linear = MaskedLinear::new(
            config.in_features.clone(),
            config.out_features.clone(),
            config.seed,
        )?
        .with_bias(config.bias)
        .with_auto_connection(config.auto_connection)
        .with_reversed_ordering(config.reversed_ordering)
        .with_elementwise_perm(config.elementwise_perm)
        .with_mask_policy(config.mask_policy);

        let activation = config
            .activation
            .as_deref()
            .map(|name| Activation::resolve(name, &config.activation_args))
            .transpose()?;
        let batch_norm = config
            .batch_norm
            .then(|| BatchNorm1d::new(linear.out_width(), config.batch_norm_args))
            .transpose()?;
        let dropout = (config.dropout > 0.0)
            .then(|| Dropout::new(config.dropout, config.seed))
            .transpose()?;

        let residual = if !config.residual {
            false
        } else if linear.in_blocks() != linear.out_blocks() {
            warn!(
                in_blocks = linear.in_blocks(),
                out_blocks = linear.out_blocks(),
                "residual requested but block counts differ; skipping it"
            );
            false
        } else if linear.in_width() != linear.out_width() {
            return Err(ShapeError::Mismatch {
                context: "residual connection".into(),
                expected: format!("out width {}", linear.in_width()),
                actual: format!("{}", linear.out_width()),
            }
            .into());
        } else {
            true
        };

        Ok(Self {
            linear,
            batch_norm,
            activation,
            dropout,
            residual,
        })
    }

    pub fn linear(&self) -> &MaskedLinear {
        &self.linear
    }

    pub fn linear_mut(&mut self) -> &mut MaskedLinear {
        &mut self.linear
    }

    pub fn activation(&self) -> Option<Activation> {
        self.activation
    }

    /// Whether the input is added back onto the output.
    pub fn residual_applies(&self) -> bool {
        self.residual
    }

    pub fn in_blocks(&self) -> usize {
        self.linear.in_blocks()
    }

    pub fn out_blocks(&self) -> usize {
        self.linear.out_blocks()
    }
}

impl PermutationModule for MaskedBlock {
    fn forward(
        &self,
        inputs: ArrayView2<'_, f64>,
        perm: Perm<'_>,
        elementwise_perm: Option<bool>,
    ) -> OcdResult<Array2<f64>> {
        let mut out = self.linear.forward(inputs, perm, elementwise_perm)?;
        if let Some(bn) = &self.batch_norm {
            out = bn.forward(out)?;
        }
        if let Some(activation) = &self.activation {
            out = activation.forward(out);
        }
        if let Some(dropout) = &self.dropout {
            out = dropout.forward(out);
        }
        if self.residual {
            out += &inputs;
        }
        Ok(out)
    }

    fn set_training(&self, training: bool) {
        if let Some(bn) = &self.batch_norm {
            bn.set_training(training);
        }
        if let Some(dropout) = &self.dropout {
            dropout.set_training(training);
        }
    }

    fn num_parameters(&self) -> usize {
        self.linear.num_parameters() + self.batch_norm.as_ref().map_or(0, |bn| bn.num_parameters())
    }
}
