//! Per-variable structural equations.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use ocd_core::NodeId;

/// Link function applied to the weighted parent sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MechanismKind {
    #[default]
    Linear,
    Tanh,
    Sin,
}

impl MechanismKind {
    fn apply(self, x: f64) -> f64 {
        match self {
            MechanismKind::Linear => x,
            MechanismKind::Tanh => x.tanh(),
            MechanismKind::Sin => x.sin(),
        }
    }
}

/// `x_i = f(bias + Σ w_j x_j) + noise_std * ε`, with `ε ~ N(0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
    /// `(parent, weight)` pairs.
    pub parents: Vec<(NodeId, f64)>,
    pub bias: f64,
    pub noise_std: f64,
    pub kind: MechanismKind,
}

impl Mechanism {
    /// A root mechanism: pure noise around `bias`.
    pub fn root(noise_std: f64) -> Self {
        Self {
            parents: Vec::new(),
            bias: 0.0,
            noise_std,
            kind: MechanismKind::Linear,
        }
    }

    /// Evaluate over all rows of `data`, whose parent columns must already be filled.
    pub fn evaluate(&self, data: &Array2<f64>, noise: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut pre = Array1::from_elem(data.nrows(), self.bias);
        for &(parent, weight) in &self.parents {
            pre.scaled_add(weight, &data.column(parent));
        }
        let mut out = pre.mapv_into(|x| self.kind.apply(x));
        out.scaled_add(self.noise_std, &noise);
        out
    }
}
