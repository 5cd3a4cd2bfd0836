//! # ocd-scm
//!
//! Synthetic data source for ordering-based causal discovery. A DAG
//! (`petgraph`) plus one mechanism per variable, sampled observationally or
//! under a single-node do-intervention.

pub mod generator;
pub mod graph;
pub mod intervention;
pub mod mechanism;
pub mod samples;
pub mod scm;
pub mod seeding;

pub use generator::{GeneratorFactory, GeneratorRegistry, ScmGenerator, ScmGeneratorArgs};
pub use graph::CausalDag;
pub use intervention::InterventionFunction;
pub use mechanism::{Mechanism, MechanismKind};
pub use samples::Samples;
pub use scm::Scm;
pub use seeding::{stream_rng, SeedStream, StreamRng};
