//! Linear map whose connectivity is gated by a permutation-derived mask.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ocd_core::config::{defaults, Features, MaskPolicy};
use ocd_core::errors::{OcdResult, ShapeError};

use crate::module::PermutationModule;
use crate::permutation::mask::{expand, feature_labels, variable_mask};
use crate::permutation::Perm;

/// `y = x · (W ⊙ M)ᵀ + b`, with `M` rebuilt from the permutation on every
/// call.
///
/// Input and output blocks are grouped over the permutation's variables, so
/// both block counts must be multiples of the number of variables.
#[derive(Debug, Clone)]
pub struct MaskedLinear {
    in_features: Features,
    out_features: Features,
    in_sizes: Vec<usize>,
    out_sizes: Vec<usize>,
    /// `(out_width, in_width)`.
    weight: Array2<f64>,
    bias: Option<Array1<f64>>,
    auto_connection: bool,
    reversed_ordering: bool,
    elementwise_perm: bool,
    mask_policy: MaskPolicy,
}

impl MaskedLinear {
    /// Uniform `±1/sqrt(in_width)` weights from `seed`, bias on,
    /// auto-connection on.
    pub fn new(
        in_features: impl Into<Features>,
        out_features: impl Into<Features>,
        seed: u64,
    ) -> OcdResult<Self> {
        let in_features = in_features.into();
        let out_features = out_features.into();
        for (side, features) in [("in_features", &in_features), ("out_features", &out_features)] {
            if !features.is_valid() {
                return Err(ShapeError::EmptyFeatures {
                    context: format!("masked linear {side}"),
                }
                .into());
            }
        }

        let (in_width, out_width) = (in_features.width(), out_features.width());
        let bound = 1.0 / (in_width as f64).sqrt();
        let mut rng = StdRng::seed_from_u64(seed);
        let weight = Array2::from_shape_fn((out_width, in_width), |_| rng.gen_range(-bound..bound));
        let bias = Array1::from_shape_fn(out_width, |_| rng.gen_range(-bound..bound));

        Ok(Self {
            in_sizes: in_features.block_sizes(),
            out_sizes: out_features.block_sizes(),
            in_features,
            out_features,
            weight,
            bias: Some(bias),
            auto_connection: defaults::DEFAULT_AUTO_CONNECTION,
            reversed_ordering: defaults::DEFAULT_REVERSED_ORDERING,
            elementwise_perm: defaults::DEFAULT_ELEMENTWISE_PERM,
            mask_policy: MaskPolicy::default(),
        })
    }

    pub fn with_bias(mut self, bias: bool) -> Self {
        if !bias {
            self.bias = None;
        } else if self.bias.is_none() {
            self.bias = Some(Array1::zeros(self.out_width()));
        }
        self
    }

    pub fn with_auto_connection(mut self, auto_connection: bool) -> Self {
        self.auto_connection = auto_connection;
        self
    }

    pub fn with_reversed_ordering(mut self, reversed_ordering: bool) -> Self {
        self.reversed_ordering = reversed_ordering;
        self
    }

    pub fn with_elementwise_perm(mut self, elementwise_perm: bool) -> Self {
        self.elementwise_perm = elementwise_perm;
        self
    }

    pub fn with_mask_policy(mut self, mask_policy: MaskPolicy) -> Self {
        self.mask_policy = mask_policy;
        self
    }

    pub fn in_features(&self) -> &Features {
        &self.in_features
    }

    pub fn out_features(&self) -> &Features {
        &self.out_features
    }

    pub fn in_blocks(&self) -> usize {
        self.in_sizes.len()
    }

    pub fn out_blocks(&self) -> usize {
        self.out_sizes.len()
    }

    pub fn in_width(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_width(&self) -> usize {
        self.weight.nrows()
    }

    pub fn auto_connection(&self) -> bool {
        self.auto_connection
    }

    pub fn reversed_ordering(&self) -> bool {
        self.reversed_ordering
    }

    pub fn elementwise_perm(&self) -> bool {
        self.elementwise_perm
    }

    pub fn weight(&self) -> &Array2<f64> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Array1<f64>> {
        self.bias.as_ref()
    }

    pub fn set_weight(&mut self, weight: Array2<f64>) -> OcdResult<()> {
        if weight.dim() != self.weight.dim() {
            return Err(ShapeError::Mismatch {
                context: "masked linear weight".into(),
                expected: format!("{:?}", self.weight.dim()),
                actual: format!("{:?}", weight.dim()),
            }
            .into());
        }
        self.weight = weight;
        Ok(())
    }

    pub fn set_bias(&mut self, bias: Option<Array1<f64>>) -> OcdResult<()> {
        if let Some(b) = &bias {
            if b.len() != self.out_width() {
                return Err(ShapeError::Mismatch {
                    context: "masked linear bias".into(),
                    expected: format!("{}", self.out_width()),
                    actual: format!("{}", b.len()),
                }
                .into());
            }
        }
        self.bias = bias;
        Ok(())
    }

    /// Feature mask for one `(n, n)` permutation, shape `(out_width, in_width)`.
    pub fn mask(&self, perm: ArrayView2<'_, f64>) -> OcdResult<Array2<f64>> {
        let n = perm.nrows();
        let vm = variable_mask(perm, self.auto_connection, self.reversed_ordering, self.mask_policy)?;
        let out_labels = feature_labels(&self.out_sizes, n)?;
        let in_labels = feature_labels(&self.in_sizes, n)?;
        Ok(expand(vm.view(), &out_labels, &in_labels))
    }

    /// `W ⊙ M`, which is also the Jacobian of the output w.r.t. the input.
    pub fn effective_weight(&self, perm: ArrayView2<'_, f64>) -> OcdResult<Array2<f64>> {
        Ok(&self.weight * &self.mask(perm)?)
    }

    fn check_input(&self, inputs: ArrayView2<'_, f64>) -> OcdResult<()> {
        if inputs.ncols() != self.in_width() {
            return Err(ShapeError::Mismatch {
                context: "masked linear input".into(),
                expected: format!("{} features", self.in_width()),
                actual: format!("{}", inputs.ncols()),
            }
            .into());
        }
        Ok(())
    }

    fn add_bias(&self, mut out: Array2<f64>) -> Array2<f64> {
        if let Some(bias) = &self.bias {
            out += bias;
        }
        out
    }
}

impl PermutationModule for MaskedLinear {
    fn forward(
        &self,
        inputs: ArrayView2<'_, f64>,
        perm: Perm<'_>,
        elementwise_perm: Option<bool>,
    ) -> OcdResult<Array2<f64>> {
        self.check_input(inputs)?;
        let elementwise = elementwise_perm.unwrap_or(self.elementwise_perm);

        match perm {
            // A shared matrix is the broadcast of itself over the batch.
            Perm::Shared(p) => {
                let w = self.effective_weight(p)?;
                Ok(self.add_bias(inputs.dot(&w.t())))
            }
            Perm::Batched(p) if elementwise => {
                let batch = inputs.nrows();
                if p.len_of(Axis(0)) != batch {
                    return Err(ShapeError::Mismatch {
                        context: "element-wise permutation".into(),
                        expected: format!("{batch} matrices"),
                        actual: format!("{}", p.len_of(Axis(0))),
                    }
                    .into());
                }
                let mut out = Array2::zeros((batch, self.out_width()));
                for ((x, p), mut y) in inputs
                    .outer_iter()
                    .zip(p.outer_iter())
                    .zip(out.outer_iter_mut())
                {
                    y.assign(&self.effective_weight(p)?.dot(&x));
                }
                Ok(self.add_bias(out))
            }
            Perm::Batched(p) => Err(ShapeError::Mismatch {
                context: "permutation".into(),
                expected: "one shared (n, n) matrix unless elementwise_perm is set".into(),
                actual: format!("{:?}", p.shape()),
            }
            .into()),
        }
    }

    fn set_training(&self, _training: bool) {}

    fn num_parameters(&self) -> usize {
        self.weight.len() + self.bias.as_ref().map_or(0, |b| b.len())
    }
}
