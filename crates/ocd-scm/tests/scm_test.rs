//! Tests for ocd-scm: DAG enforcement, simulation, generators.

use ocd_core::OcdError;
use ocd_scm::generator::{GraphKind, RandomScmGenerator};
use ocd_scm::{
    CausalDag, GeneratorRegistry, InterventionFunction, Mechanism, MechanismKind, Scm,
    ScmGenerator, ScmGeneratorArgs,
};

/// x0 → x1 → x2 with unit weights and no noise on x1, x2.
fn chain_scm() -> Scm {
    let dag = CausalDag::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
    let mechanisms = vec![
        Mechanism::root(1.0),
        Mechanism {
            parents: vec![(0, 2.0)],
            bias: 1.0,
            noise_std: 0.0,
            kind: MechanismKind::Linear,
        },
        Mechanism {
            parents: vec![(1, -1.0)],
            bias: 0.0,
            noise_std: 0.0,
            kind: MechanismKind::Linear,
        },
    ];
    Scm::new(dag, mechanisms).unwrap()
}

// =============================================================================
// DAG enforcement
// =============================================================================
#[test]
fn dag_rejects_cycles_and_self_loops() {
    let mut dag = CausalDag::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
    let err = dag.add_edge(2, 0).unwrap_err();
    assert!(matches!(err, OcdError::GraphError(_)));
    assert!(err.to_string().contains("x2 -> x0 -> x1 -> x2"));
    assert!(dag.add_edge(1, 1).is_err());
    assert_eq!(dag.edge_count(), 2);
}

#[test]
fn dag_rejects_unknown_nodes() {
    let mut dag = CausalDag::new(2);
    assert!(dag.add_edge(0, 5).is_err());
}

#[test]
fn backward_edges_count_ordering_violations() {
    let dag = CausalDag::from_edges(3, &[(0, 1), (1, 2), (0, 2)]).unwrap();
    assert_eq!(dag.backward_edge_count(&[0, 1, 2]).unwrap(), 0);
    assert!(dag.is_consistent_ordering(&[0, 1, 2]).unwrap());
    assert_eq!(dag.backward_edge_count(&[2, 1, 0]).unwrap(), 3);
    assert_eq!(dag.backward_edge_count(&[1, 0, 2]).unwrap(), 1);
    assert!(dag.backward_edge_count(&[0, 1]).is_err());
    assert!(dag.backward_edge_count(&[0, 0, 1]).is_err());
}

// =============================================================================
// Simulation
// =============================================================================
#[test]
fn simulate_respects_mechanisms() {
    let scm = chain_scm();
    let samples = scm.simulate(20, 3, None, None).unwrap();
    assert_eq!(samples.nrows(), 20);
    assert_eq!(samples.columns(), &["x0", "x1", "x2"]);
    for r in 0..20 {
        let row = samples.row(r);
        assert!((row[1] - (2.0 * row[0] + 1.0)).abs() < 1e-12);
        assert!((row[2] + row[1]).abs() < 1e-12);
    }
}

#[test]
fn simulate_is_deterministic_per_seed() {
    let scm = chain_scm();
    let a = scm.simulate(50, 11, None, None).unwrap();
    let b = scm.simulate(50, 11, None, None).unwrap();
    let c = scm.simulate(50, 12, None, None).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn intervention_cuts_incoming_edges_and_propagates_downstream() {
    let scm = chain_scm();
    let f = InterventionFunction::Constant { value: 4.0 };
    let samples = scm.simulate(10, 0, Some(1), Some(&f)).unwrap();
    for r in 0..10 {
        let row = samples.row(r);
        assert_eq!(row[1], 4.0);
        assert_eq!(row[2], -4.0);
    }
}

#[test]
fn intervention_on_unknown_node_fails() {
    let scm = chain_scm();
    assert!(matches!(
        scm.simulate(10, 0, Some(3), None),
        Err(OcdError::GraphError(_))
    ));
}

#[test]
fn scm_rejects_mechanisms_that_disagree_with_dag() {
    let dag = CausalDag::from_edges(2, &[(0, 1)]).unwrap();
    let result = Scm::new(dag, vec![Mechanism::root(1.0), Mechanism::root(1.0)]);
    assert!(matches!(result, Err(OcdError::ShapeError(_))));
}

// =============================================================================
// Generators
// =============================================================================
#[test]
fn generator_is_deterministic_for_a_seed() {
    let args = ScmGeneratorArgs {
        num_nodes: 8,
        ..Default::default()
    };
    let mut a = RandomScmGenerator::new(GraphKind::ErdosRenyi, 42, args.clone());
    let mut b = RandomScmGenerator::new(GraphKind::ErdosRenyi, 42, args);
    let scm_a = a.generate_scm().unwrap();
    let scm_b = b.generate_scm().unwrap();
    assert_eq!(scm_a.dag().edges(), scm_b.dag().edges());
    assert_eq!(scm_a.mechanisms(), scm_b.mechanisms());

    // Regenerating from the same instance yields the same model.
    let again = a.generate_scm().unwrap();
    assert_eq!(again.dag().edges(), scm_a.dag().edges());
}

#[test]
fn chain_and_full_have_expected_edge_counts() {
    let args = ScmGeneratorArgs {
        num_nodes: 6,
        ..Default::default()
    };
    let chain = RandomScmGenerator::new(GraphKind::Chain, 1, args.clone())
        .generate_scm()
        .unwrap();
    assert_eq!(chain.dag().edge_count(), 5);
    let full = RandomScmGenerator::new(GraphKind::Full, 1, args)
        .generate_scm()
        .unwrap();
    assert_eq!(full.dag().edge_count(), 15);
}

#[test]
fn registry_resolves_builtins_and_rejects_unknown_keys() {
    let registry = GeneratorRegistry::default();
    assert_eq!(registry.keys(), vec!["chain", "erdos_renyi", "full"]);

    let factory = registry.resolve("chain").unwrap();
    let mut generator = factory(0, &serde_json::json!({ "num_nodes": 4 })).unwrap();
    assert_eq!(generator.name(), "chain");
    assert_eq!(generator.generate_scm().unwrap().nodes(), vec![0, 1, 2, 3]);

    assert!(registry.resolve("barabasi").is_err());
}

#[test]
fn generator_args_reject_bad_values() {
    assert!(ScmGeneratorArgs::from_value(&serde_json::json!({ "num_nodes": 0 })).is_err());
    assert!(ScmGeneratorArgs::from_value(&serde_json::json!({ "edge_probability": 2.0 })).is_err());
    assert!(ScmGeneratorArgs::from_value(&serde_json::json!({ "nodes": 3 })).is_err());
}
