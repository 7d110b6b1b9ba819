use kcmap_engine::{propagate, PropagationConfig, PropagationError, Propagator};
use kcmap_model::{
    render, DirectedRelation, Graph, Language, LemmaTable, OperationFact, OperationLemma, Rule,
    Status, TierMap,
};

fn kc_map() -> Graph {
    let mut g = Graph::new(vec![
        Language::new("obdd", "OBDD")
            .with_operation("CO", OperationFact::asserted(Status::Poly).with_refs(["bryant86"]))
            .with_operation("CD", OperationFact::asserted(Status::Poly).with_refs(["bryant86"])),
        Language::new("dnnf", "DNNF"),
        Language::new("cnf", "CNF")
            .with_operation("CO", OperationFact::asserted(Status::NoPolyUnknownQuasi).with_caveat("P != NP")),
    ]);
    g.prepare().unwrap();
    g.assert_relation(
        "dnnf",
        "obdd",
        Some(DirectedRelation::asserted(Status::UnknownPolyQuasi).with_refs(["compile"])),
    )
    .unwrap();
    g.assert_relation(
        "cnf",
        "dnnf",
        Some(DirectedRelation::asserted(Status::Poly).with_refs(["tseitin"])),
    )
    .unwrap();
    g
}

#[test]
fn operations_follow_edges_and_lemmas() {
    let mut g = kc_map();
    let summary = propagate(&mut g).unwrap();
    assert!(summary.operation_changes > 0);

    // obdd: CD ∧ CO ⇒ CE and ME.
    assert_eq!(g.operation("obdd", "CE").unwrap().status, Status::Poly);
    assert_eq!(g.operation("obdd", "ME").unwrap().status, Status::Poly);

    // dnnf → obdd is quasi, so dnnf answers CO in quasi-polynomial time ...
    let co = g.operation("dnnf", "CO").unwrap();
    assert!(co.derived);
    assert!(co.status.guarantees(kcmap_model::Tier::Quasi));
    // ... while cnf ↛ CO in poly time and cnf → dnnf is poly, so dnnf cannot be poly.
    assert_eq!(co.status, Status::NoPolyQuasi);
    let proof = co.proof.as_ref().unwrap();
    assert_eq!(proof.quasi_part().unwrap().rule, Rule::Composition);
    assert_eq!(proof.no_poly_part().unwrap().rule, Rule::Contrapositive);

    let text = render::proof(proof, &g.names());
    assert!(text.contains("DNNF → OBDD"), "{text}");
    assert!(text.contains("CO on CNF"), "{text}");
    assert_eq!(
        co.caveat.as_ref().map(ToString::to_string).as_deref(),
        Some("P != NP")
    );
}

#[test]
fn operation_pass_can_be_disabled() {
    let mut g = kc_map();
    let propagator = Propagator::standard().with_config(PropagationConfig {
        operations: false,
        ..PropagationConfig::default()
    });
    let summary = propagator.run(&mut g).unwrap();
    assert_eq!(summary.operation_changes, 0);
    assert!(g.operation("obdd", "CE").is_none());
    // The edge passes still ran, and the validator still composes queries:
    // cnf → obdd polynomial would make CO on CNF polynomial.
    assert_eq!(
        g.relation("cnf", "obdd").unwrap().map(|r| r.status),
        Some(Status::NoPolyQuasi)
    );
}

#[test]
fn custom_lemma_table_with_quasi_bound() {
    let mut g = Graph::new(vec![
        Language::new("l", "L").with_operation("A", OperationFact::asserted(Status::Poly))
    ]);
    g.prepare().unwrap();

    let mut lemma = OperationLemma::new("a-b", &["A"], "B", "B reduces to A with quasi overhead");
    lemma.bound = TierMap::Quasi;
    lemma.refs = vec!["folklore".into()];
    let table = LemmaTable {
        operations: Default::default(),
        lemmas: vec![lemma],
    };
    let propagator = Propagator::new(kcmap_engine::ReachabilityValidator::new(&table), table);
    propagator.run(&mut g).unwrap();

    let b = g.operation("l", "B").unwrap();
    assert_eq!(b.status, Status::UnknownPolyQuasi);
    assert_eq!(b.refs, vec!["folklore"]);
}

#[test]
fn query_support_contradicting_an_edge_is_rejected() {
    let mut g = kc_map();
    g.assert_operation("dnnf", "CO", OperationFact::asserted(Status::NoQuasi))
        .unwrap();
    let err = propagate(&mut g).unwrap_err();
    assert!(matches!(err, PropagationError::Inconsistent { .. }), "{err}");
}
