//! Structural causal model: a shared DAG plus one mechanism per variable.

use std::sync::Arc;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use ocd_core::errors::{GraphError, OcdResult, ShapeError};
use ocd_core::NodeId;

use crate::graph::CausalDag;
use crate::intervention::InterventionFunction;
use crate::mechanism::Mechanism;
use crate::samples::Samples;

/// A structural causal model.
///
/// The DAG sits behind an `Arc` so every dataset drawn from this model can
/// hold it without copying.
#[derive(Debug, Clone)]
pub struct Scm {
    dag: Arc<CausalDag>,
    mechanisms: Vec<Mechanism>,
    order: Vec<NodeId>,
}

impl Scm {
    /// Pair a DAG with its mechanisms. Mechanism `i` must list exactly the
    /// parents of variable `i`.
    pub fn new(dag: CausalDag, mechanisms: Vec<Mechanism>) -> OcdResult<Self> {
        if mechanisms.len() != dag.node_count() {
            return Err(ShapeError::Mismatch {
                context: "scm mechanisms".into(),
                expected: format!("{} mechanisms", dag.node_count()),
                actual: format!("{}", mechanisms.len()),
            }
            .into());
        }
        for (node, mechanism) in mechanisms.iter().enumerate() {
            let mut declared: Vec<NodeId> = mechanism.parents.iter().map(|&(p, _)| p).collect();
            declared.sort_unstable();
            let expected = dag.parents(node)?;
            if declared != expected {
                return Err(ShapeError::Mismatch {
                    context: format!("parents of x{node}"),
                    expected: format!("{expected:?}"),
                    actual: format!("{declared:?}"),
                }
                .into());
            }
        }
        let order = dag.topological_order()?;
        Ok(Self {
            dag: Arc::new(dag),
            mechanisms,
            order,
        })
    }

    /// The shared DAG.
    pub fn dag(&self) -> &Arc<CausalDag> {
        &self.dag
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.dag.nodes()
    }

    pub fn mechanisms(&self) -> &[Mechanism] {
        &self.mechanisms
    }

    /// Draw `n` rows.
    ///
    /// With `intervention_node` set, that variable is replaced by
    /// `intervention_function` (the default function when none is given)
    /// and its descendants see the forced values. Identical arguments give
    /// bit-identical samples.
    pub fn simulate(
        &self,
        n: usize,
        seed: u64,
        intervention_node: Option<NodeId>,
        intervention_function: Option<&InterventionFunction>,
    ) -> OcdResult<Samples> {
        let num_nodes = self.dag.node_count();
        if let Some(node) = intervention_node {
            if node >= num_nodes {
                return Err(GraphError::UnknownNode {
                    node,
                    node_count: num_nodes,
                }
                .into());
            }
        }
        let default_function = InterventionFunction::default();
        let function = intervention_function.unwrap_or(&default_function);

        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Array2::from_shape_fn((n, num_nodes), |_| rng.sample::<f64, _>(StandardNormal));

        let mut data = Array2::<f64>::zeros((n, num_nodes));
        for &node in &self.order {
            let natural = self.mechanisms[node].evaluate(&data, noise.column(node));
            let column = if intervention_node == Some(node) {
                function.intervene(natural.view(), &mut rng)
            } else {
                natural
            };
            data.column_mut(node).assign(&column);
        }

        let columns = (0..num_nodes)
            .map(|i| self.dag.name(i).unwrap_or_default().to_string())
            .collect();
        Ok(Samples::new(data, columns))
    }
}
