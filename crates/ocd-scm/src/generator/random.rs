//! Random DAG + mechanism generators.

use rand::seq::SliceRandom;
use rand::Rng;

use ocd_core::errors::OcdResult;

use super::{ScmGenerator, ScmGeneratorArgs};
use crate::graph::CausalDag;
use crate::mechanism::Mechanism;
use crate::scm::Scm;
use crate::seeding::{stream_rng, SeedStream, StreamRng};

/// Shape of the random DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    /// Each forward pair of a random causal order is an edge with `edge_probability`.
    ErdosRenyi,
    /// A single path through a random causal order.
    Chain,
    /// Every forward pair of a random causal order is an edge.
    Full,
}

impl GraphKind {
    pub fn key(&self) -> &'static str {
        match self {
            GraphKind::ErdosRenyi => "erdos_renyi",
            GraphKind::Chain => "chain",
            GraphKind::Full => "full",
        }
    }
}

/// Generates SCMs with a hidden random causal order.
///
/// Every call to `generate_scm` restarts from the construction seed, so
/// the same generator always yields the same model.
#[derive(Debug, Clone)]
pub struct RandomScmGenerator {
    kind: GraphKind,
    args: ScmGeneratorArgs,
    seed: u64,
}

impl RandomScmGenerator {
    pub fn new(kind: GraphKind, seed: u64, args: ScmGeneratorArgs) -> Self {
        Self { kind, args, seed }
    }

    pub fn args(&self) -> &ScmGeneratorArgs {
        &self.args
    }

    fn sample_weight(&self, rng: &mut StreamRng) -> f64 {
        let magnitude = if self.args.weight_low < self.args.weight_high {
            rng.gen_range(self.args.weight_low..self.args.weight_high)
        } else {
            self.args.weight_low
        };
        if rng.gen_bool(0.5) {
            magnitude
        } else {
            -magnitude
        }
    }
}

impl ScmGenerator for RandomScmGenerator {
    fn name(&self) -> &str {
        self.kind.key()
    }

    fn generate_scm(&mut self) -> OcdResult<Scm> {
        let n = self.args.num_nodes;
        let mut rng = stream_rng(self.seed, SeedStream::Structure, 0);

        let mut causal_order: Vec<usize> = (0..n).collect();
        causal_order.shuffle(&mut rng);

        let mut dag = CausalDag::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let connect = match self.kind {
                    GraphKind::ErdosRenyi => rng.gen_bool(self.args.edge_probability),
                    GraphKind::Chain => j == i + 1,
                    GraphKind::Full => true,
                };
                if connect {
                    dag.add_edge(causal_order[i], causal_order[j])?;
                }
            }
        }

        let mut mechanisms = Vec::with_capacity(n);
        for node in 0..n {
            let parents = dag
                .parents(node)?
                .into_iter()
                .map(|p| (p, self.sample_weight(&mut rng)))
                .collect::<Vec<_>>();
            mechanisms.push(Mechanism {
                kind: if parents.is_empty() {
                    Default::default()
                } else {
                    self.args.mechanism
                },
                parents,
                bias: 0.0,
                noise_std: self.args.noise_std,
            });
        }

        tracing::debug!(
            generator = self.kind.key(),
            nodes = n,
            edges = dag.edge_count(),
            "generated scm"
        );
        Scm::new(dag, mechanisms)
    }
}
