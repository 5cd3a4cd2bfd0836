//! Immutable dataset records and index views over them.

use std::sync::Arc;

use ndarray::ArrayView1;
use rand::seq::SliceRandom;
use rand::Rng;

use ocd_core::errors::{OcdResult, ShapeError};
use ocd_core::NodeId;
use ocd_scm::{CausalDag, Samples};

/// One simulated sample together with the DAG it came from.
#[derive(Debug, Clone)]
pub struct OcdDataset {
    samples: Samples,
    dag: Arc<CausalDag>,
    intervention_column: Option<NodeId>,
    name: String,
}

impl OcdDataset {
    pub fn new(
        samples: Samples,
        dag: Arc<CausalDag>,
        intervention_column: Option<NodeId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            samples,
            dag,
            intervention_column,
            name: name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `index` of the sample table.
    pub fn get(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.len()).then(|| self.samples.row(index))
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn dag(&self) -> &Arc<CausalDag> {
        &self.dag
    }

    /// The variable that was forced, `None` for observational data.
    pub fn intervention_column(&self) -> Option<NodeId> {
        self.intervention_column
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A view of some rows of a dataset. Cloning shares the indices.
#[derive(Debug, Clone)]
pub struct Subset {
    dataset: Arc<OcdDataset>,
    indices: Arc<[usize]>,
}

impl Subset {
    /// View over every row, in order.
    pub fn full(dataset: Arc<OcdDataset>) -> Self {
        let indices: Arc<[usize]> = (0..dataset.len()).collect();
        Self { dataset, indices }
    }

    pub fn new(dataset: Arc<OcdDataset>, indices: Vec<usize>) -> OcdResult<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= dataset.len()) {
            return Err(ShapeError::Mismatch {
                context: format!("subset of `{}`", dataset.name()),
                expected: format!("indices below {}", dataset.len()),
                actual: bad.to_string(),
            }
            .into());
        }
        Ok(Self {
            dataset,
            indices: indices.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn dataset(&self) -> &Arc<OcdDataset> {
        &self.dataset
    }
}

/// Split `dataset` into a random `train_len`-row view and a view of the rest.
///
/// Draws one permutation from `rng`, so consecutive calls with the same
/// generator give different but reproducible splits.
pub fn random_split<R: Rng + ?Sized>(
    dataset: &Arc<OcdDataset>,
    train_len: usize,
    rng: &mut R,
) -> OcdResult<(Subset, Subset)> {
    let len = dataset.len();
    if train_len > len {
        return Err(ShapeError::Mismatch {
            context: format!("split of `{}`", dataset.name()),
            expected: format!("train length at most {len}"),
            actual: train_len.to_string(),
        }
        .into());
    }
    let mut permutation: Vec<usize> = (0..len).collect();
    permutation.shuffle(rng);
    let val = permutation.split_off(train_len);
    Ok((
        Subset {
            dataset: Arc::clone(dataset),
            indices: permutation.into(),
        },
        Subset {
            dataset: Arc::clone(dataset),
            indices: val.into(),
        },
    ))
}
