//! Common interface of permutation-conditioned layers.

use ndarray::{Array2, ArrayView2};

use ocd_core::errors::OcdResult;

use crate::permutation::Perm;

/// A layer whose forward pass takes a permutation matrix alongside its input.
pub trait PermutationModule {
    /// Map `(batch, in_width)` inputs to `(batch, out_width)` outputs.
    ///
    /// `elementwise_perm` overrides the layer's own setting for this call.
    fn forward(
        &self,
        inputs: ArrayView2<'_, f64>,
        perm: Perm<'_>,
        elementwise_perm: Option<bool>,
    ) -> OcdResult<Array2<f64>>;

    /// Switch between training and evaluation behaviour.
    fn set_training(&self, training: bool);

    /// Number of trainable scalars.
    fn num_parameters(&self) -> usize;

    fn train(&self) {
        self.set_training(true);
    }

    fn eval(&self) {
        self.set_training(false);
    }
}
