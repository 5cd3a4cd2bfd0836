//! Property tests for ocd-scm.

use proptest::prelude::*;

use ocd_scm::generator::{GraphKind, RandomScmGenerator};
use ocd_scm::graph::dag_enforcement;
use ocd_scm::{CausalDag, ScmGenerator, ScmGeneratorArgs};

fn edge_strategy(n: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..n, 0..n), 0..n * 3)
}

proptest! {
    #[test]
    fn inserted_edges_never_form_cycles(edges in edge_strategy(12)) {
        let mut dag = CausalDag::new(12);
        for (a, b) in edges {
            let _ = dag.add_edge(a, b);
        }
        prop_assert!(dag_enforcement::find_cycles(dag.graph()).is_empty());
        let order = dag.topological_order().unwrap();
        prop_assert!(dag.is_consistent_ordering(&order).unwrap());
    }

    #[test]
    fn generated_scms_are_acyclic_and_reproducible(
        seed in 0_u64..1_000,
        num_nodes in 1_usize..10,
        edge_probability in 0.0_f64..=1.0,
    ) {
        let args = ScmGeneratorArgs { num_nodes, edge_probability, ..Default::default() };
        let mut generator = RandomScmGenerator::new(GraphKind::ErdosRenyi, seed, args);
        let scm = generator.generate_scm().unwrap();
        prop_assert_eq!(scm.nodes().len(), num_nodes);
        prop_assert!(dag_enforcement::find_cycles(scm.dag().graph()).is_empty());

        let a = scm.simulate(16, seed, None, None).unwrap();
        let b = scm.simulate(16, seed, None, None).unwrap();
        prop_assert_eq!(a, b);
    }
}
