use kcmap_engine::{propagate, ConsistencyValidator, ReachabilityPair, ReachabilityValidator};
use kcmap_model::{DirectedRelation, Graph, Language, OperationFact, Status, Tier};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = Option<Status>> {
    prop::option::weighted(0.35, prop::sample::select(Status::ALL.to_vec()))
}

/// Queries tied together by the standard lemmas (CT ⇒ CO, CT ⇒ VA, CE ⇒ CO).
const QUERIES: [&str; 4] = ["CO", "CT", "CE", "VA"];

fn operations_strategy() -> impl Strategy<Value = Vec<Option<Status>>> {
    prop::collection::vec(
        prop::option::weighted(0.25, prop::sample::select(Status::ALL.to_vec())),
        QUERIES.len(),
    )
}

fn language(i: usize, operations: &[Option<Status>]) -> Language {
    QUERIES.iter().zip(operations).fold(
        Language::new(format!("l{i}"), format!("L{i}")),
        |lang, (op, status)| match status {
            Some(status) => lang.with_operation(*op, OperationFact::asserted(*status)),
            None => lang,
        },
    )
}

/// Random graphs over 3..=5 languages, sparse enough to often be consistent,
/// with a few asserted query facts per language.
fn graph_strategy() -> impl Strategy<Value = Graph> {
    (3usize..=5)
        .prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec(status_strategy(), n * n),
                prop::collection::vec(operations_strategy(), n),
            )
        })
        .prop_map(|(n, cells, operations)| {
            let mut g = Graph::new(
                operations
                    .iter()
                    .enumerate()
                    .map(|(i, ops)| language(i, ops))
                    .collect(),
            );
            for i in 0..n {
                for j in 0..n {
                    if i != j {
                        g.adjacency_matrix
                            .set(i, j, cells[i * n + j].map(DirectedRelation::asserted));
                    }
                }
            }
            g
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn successful_runs_are_closed_and_consistent(input in graph_strategy()) {
        let mut g = input.clone();
        if propagate(&mut g).is_err() {
            return Ok(());
        }
        let matrix = &g.adjacency_matrix;
        let reach = ReachabilityPair::compute(matrix);

        for (i, j) in matrix.pairs() {
            let after = kcmap_model::status::effective(matrix.status(i, j));
            if reach.poly.reaches(i, j) {
                prop_assert!(after.guarantees(Tier::Poly), "({i},{j}) is {after}");
            }
            if reach.quasi.reaches(i, j) {
                prop_assert!(after.guarantees(Tier::Quasi), "({i},{j}) is {after}");
            }
            if let Some(before) = input.adjacency_matrix.status(i, j) {
                prop_assert!(after.is_refinement_of(before), "({i},{j}) {before} -> {after}");
                let rel = matrix.get(i, j).unwrap();
                prop_assert_eq!(rel.derived, after != before);
            }
        }
        for (lang, asserted) in g.languages.iter().zip(&input.languages) {
            for (op, before) in &asserted.operations {
                let after = lang.operations[op].status;
                prop_assert!(
                    after.is_refinement_of(before.status),
                    "{op} on {}: {} -> {after}",
                    lang.id,
                    before.status
                );
            }
        }
        prop_assert!(reach.poly.is_subset_of(&reach.quasi));
        prop_assert!(ReachabilityValidator::default().validate(&g).unwrap().ok());
    }

    #[test]
    fn propagation_is_idempotent(input in graph_strategy()) {
        let mut g = input;
        if propagate(&mut g).is_err() {
            return Ok(());
        }
        let once = serde_json::to_value(&g).unwrap();
        let summary = propagate(&mut g).unwrap();
        prop_assert_eq!(summary.total_changes(), 0);
        prop_assert_eq!(serde_json::to_value(&g).unwrap(), once);
    }

    #[test]
    fn inconsistent_inputs_are_never_accepted(input in graph_strategy()) {
        let mut prepared = input.clone();
        prepared.prepare().unwrap();
        let inconsistent = !ReachabilityValidator::default().validate(&prepared).unwrap().ok();
        let mut g = input;
        if inconsistent {
            prop_assert!(propagate(&mut g).is_err());
        }
    }
}
