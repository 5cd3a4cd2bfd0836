use ndarray::{Array2, ArrayView2};
use tracing::debug;

use ocd_core::config::{Features, MaskedBlockConfig, MaskedMlpConfig};
use ocd_core::errors::OcdResult;

use super::{MaskedBlock, MaskedLinear};
use crate::module::PermutationModule;
use crate::permutation::Perm;

/// Hidden masked blocks followed by a masked linear output layer, all fed
/// the same permutation.
///
/// The output layer never self-connects, so output block `i` depends only
/// on inputs strictly before `i` in the ordering.
#[derive(Debug)]
pub struct MaskedMlp {
    hidden: Vec<MaskedBlock>,
    output: MaskedLinear,
}

impl MaskedMlp {
    /// Block `k` is seeded with `seed + k`; the output layer comes last.
    pub fn from_config(config: &MaskedMlpConfig) -> OcdResult<Self> {
        let mut hidden = Vec::with_capacity(config.hidden_features.len());
        let mut previous: Features = config.in_features.clone();
        for (k, features) in config.hidden_features.iter().enumerate() {
            let block = MaskedBlock::from_config(&MaskedBlockConfig {
                in_features: previous,
                out_features: features.clone(),
                bias: config.bias,
                elementwise_perm: config.elementwise_perm,
                residual: config.residual,
                activation: config.activation.clone(),
                activation_args: config.activation_args.clone(),
                batch_norm: config.batch_norm,
                batch_norm_args: config.batch_norm_args,
                dropout: config.dropout,
                auto_connection: config.auto_connection,
                reversed_ordering: config.reversed_ordering,
                mask_policy: config.mask_policy,
                seed: config.seed.wrapping_add(k as u64),
            })?;
            hidden.push(block);
            previous = features.clone();
        }

        let output = MaskedLinear::new(
            previous,
            config.out_features.clone(),
            config.seed.wrapping_add(config.hidden_features.len() as u64),
        )?
        .with_bias(config.bias)
        .with_auto_connection(false)
        .with_reversed_ordering(config.reversed_ordering)
        .with_elementwise_perm(config.elementwise_perm)
        .with_mask_policy(config.mask_policy);

        let mlp = Self { hidden, output };
        debug!(
            hidden = mlp.hidden.len(),
            parameters = mlp.num_parameters(),
            "built masked mlp"
        );
        Ok(mlp)
    }

    pub fn hidden(&self) -> &[MaskedBlock] {
        &self.hidden
    }

    pub fn output(&self) -> &MaskedLinear {
        &self.output
    }

    pub fn depth(&self) -> usize {
        self.hidden.len() + 1
    }
}

impl PermutationModule for MaskedMlp {
    fn forward(
        &self,
        inputs: ArrayView2<'_, f64>,
        perm: Perm<'_>,
        elementwise_perm: Option<bool>,
    ) -> OcdResult<Array2<f64>> {
        let mut x = inputs.to_owned();
        for block in &self.hidden {
            x = block.forward(x.view(), perm, elementwise_perm)?;
        }
        self.output.forward(x.view(), perm, elementwise_perm)
    }

    fn set_training(&self, training: bool) {
        for block in &self.hidden {
            block.set_training(training);
        }
    }

    fn num_parameters(&self) -> usize {
        self.hidden.iter().map(|b| b.num_parameters()).sum::<usize>() + self.output.num_parameters()
    }
}
