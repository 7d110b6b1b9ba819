//! End-to-end tests over a small but realistic KC map
//!
//! The fixture holds the classic NNF / DNNF / d-DNNF / SDD / OBDD chain
//! plus DNF and CNF, a handful of operation facts and two negative edges.
//!
//! Run with: cargo test --test integration_tests

use kcmap_engine::{propagate, ConsistencyValidator, PropagationError, ReachabilityValidator};
use kcmap_model::{render, Graph, Rule, Status};
use tempfile::tempdir;

fn fixture() -> Graph {
    let mut graph: Graph =
        serde_json::from_str(include_str!("fixtures/kc_map.json")).expect("fixture parses");
    graph.prepare().expect("fixture is well formed");
    graph
}

fn status(graph: &Graph, from: &str, to: &str) -> Option<Status> {
    graph.relation(from, to).unwrap().map(|r| r.status)
}

// ============================================================================
// Edge propagation
// ============================================================================

#[test]
fn test_succinctness_chain_is_closed() {
    let mut graph = fixture();
    propagate(&mut graph).unwrap();

    for (from, to) in [
        ("obdd", "ddnnf"),
        ("obdd", "dnnf"),
        ("obdd", "nnf"),
        ("sdd", "dnnf"),
        ("sdd", "nnf"),
        ("ddnnf", "nnf"),
        ("dnf", "nnf"),
    ] {
        let rel = graph.relation(from, to).unwrap().unwrap();
        assert_eq!(rel.status, Status::Poly, "{from} → {to}");
        assert!(rel.derived, "{from} → {to}");
    }

    let rel = graph.relation("obdd", "nnf").unwrap().unwrap();
    assert!(rel.refs.contains(&"darwiche-2011".to_string()));
    assert!(rel.refs.contains(&"darwiche-marquis-2002".to_string()));
}

#[test]
fn test_negative_edges_push_back_through_the_chain() {
    let mut graph = fixture();
    propagate(&mut graph).unwrap();

    // NNF → OBDD polynomial would give NNF → DNNF polynomial, and CO on
    // NNF polynomial through DNNF: two independent refutations.
    for to in ["obdd", "sdd", "ddnnf", "dnf"] {
        let rel = graph.relation("nnf", to).unwrap().unwrap();
        assert_eq!(rel.status, Status::NoPolyUnknownQuasi, "nnf → {to}");
        assert_eq!(
            rel.caveat.as_ref().map(ToString::to_string).as_deref(),
            Some("P != NP or PH does not collapse")
        );
        let proof = rel.proof.as_ref().unwrap();
        assert!(matches!(proof.no_poly_part().unwrap().rule, Rule::Refutation { .. }));
    }

    // Asserted facts are never rewritten, and nothing forces CNF → DNNF.
    let dnnf_obdd = graph.relation("dnnf", "obdd").unwrap().unwrap();
    assert_eq!(dnnf_obdd.status, Status::NoQuasi);
    assert!(!dnnf_obdd.derived);
    assert_eq!(status(&graph, "cnf", "dnnf"), None);
}

#[test]
fn test_operations_follow_the_chain() {
    let mut graph = fixture();
    let summary = propagate(&mut graph).unwrap();
    assert!(summary.operation_changes > 0);

    // CD ∧ CO on DNNF give CE and ME; every language compiling to DNNF inherits them.
    for lang in ["dnnf", "ddnnf", "sdd", "obdd", "dnf"] {
        for op in ["CO", "CE", "ME"] {
            let fact = graph.operation(lang, op).unwrap();
            assert_eq!(fact.status, Status::Poly, "{op} on {lang}");
        }
    }
    let co = graph.operation("obdd", "CO").unwrap();
    assert!(co.derived);
    let text = render::proof(co.proof.as_ref().unwrap(), &graph.names());
    assert!(text.contains("OBDD → DNNF is polynomial"), "{text}");

    // NNF lacks polynomial CO, so it lacks polynomial CT and CE as well.
    assert_eq!(graph.operation("nnf", "CT").unwrap().status, Status::NoPolyUnknownQuasi);
    assert_eq!(graph.operation("nnf", "CE").unwrap().status, Status::NoPolyUnknownQuasi);

    assert!(ReachabilityValidator::default().validate(&graph).unwrap().ok());
}

#[test]
fn test_propagated_document_round_trips() {
    let mut graph = fixture();
    propagate(&mut graph).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("database.json");
    std::fs::write(&path, serde_json::to_string_pretty(&graph).unwrap()).unwrap();

    let mut reloaded: Graph =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let summary = propagate(&mut reloaded).unwrap();
    assert_eq!(summary.total_changes(), 0);
    assert_eq!(
        serde_json::to_value(&reloaded).unwrap(),
        serde_json::to_value(&graph).unwrap()
    );
}

// ============================================================================
// Rejected inputs
// ============================================================================

#[test]
fn test_contradicting_assertion_is_rejected() {
    let mut graph = fixture();
    graph
        .assert_relation("obdd", "nnf", Some(kcmap_model::DirectedRelation::asserted(Status::NoQuasi)))
        .unwrap();
    let err = propagate(&mut graph).unwrap_err();
    assert!(matches!(err, PropagationError::Inconsistent { .. }));
    let message = err.to_string();
    assert!(message.contains("OBDD → SDD"), "{message}");
}
