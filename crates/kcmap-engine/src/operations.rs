//! Operation-level propagation.
//!
//! Runs after the edge passes have converged, over three rule families:
//!
//! - **lemmas**: antecedents guaranteed at tier `t` give the conclusion at
//!   the lemma's bound of `t` (the weakest antecedent tier counts);
//! - **composition**: `L1 → L2` guaranteed at tier `e` and query `X` on
//!   `L2` at tier `c` give `X` on `L1` at `e ∘ c`;
//! - **contrapositives** of both: a conclusion that is ruled out pushes
//!   the negation onto the single antecedent not already guaranteed, and a
//!   query ruled out on `L1` is ruled out on every `L2` it transforms into.
//!
//! Each sweep collects the candidate updates against a frozen view of the
//! graph, then applies them in order through [`Status::refine`]; the
//! passes repeat until a sweep changes nothing.

use crate::describe::{self, Half};
use crate::error::PropagationError;
use crate::propagate::PropagationContext;
use crate::validator::edge_step;
use kcmap_model::relation::merge_proof;
use kcmap_model::status::effective;
use kcmap_model::{
    render, Derivation, Graph, Knowledge, Language, LemmaTable, OperationFact, Proof, ProofStep,
    Rule, Status, Tier,
};
use tracing::{debug, info};

/// A candidate refinement of one operation fact.
#[derive(Debug, Clone)]
struct Update {
    position: usize,
    operation: String,
    knowledge: Knowledge,
    rule: Rule,
    steps: Vec<ProofStep>,
}

/// Run the three rule families to a fixed point, then check the result.
///
/// Returns the number of operation facts changed.
pub fn propagate_operations(
    graph: &mut Graph,
    table: &LemmaTable,
    ctx: &PropagationContext,
) -> Result<usize, PropagationError> {
    let positions = language_positions(graph);
    let mut total = 0;

    for sweep in 1..=ctx.config.max_sweeps {
        let mut changed = 0;
        changed += apply_all(graph, lemma_upgrades(graph, table), ctx)?;
        changed += apply_all(graph, composition_upgrades(graph, table, &positions), ctx)?;
        changed += apply_all(graph, contrapositives(graph, table, &positions), ctx)?;
        total += changed;
        if changed == 0 {
            info!(sweeps = sweep, changes = total, "operation pass converged");
            check_operations(graph, table, ctx)?;
            return Ok(total);
        }
    }

    Err(PropagationError::NoConvergence {
        phase: "operation pass",
        sweeps: ctx.config.max_sweeps,
    })
}

/// Fail when some rule would force a fact that contradicts a stored one.
pub fn check_operations(
    graph: &Graph,
    table: &LemmaTable,
    ctx: &PropagationContext,
) -> Result<(), PropagationError> {
    let positions = language_positions(graph);
    let candidates = lemma_upgrades(graph, table)
        .into_iter()
        .chain(composition_upgrades(graph, table, &positions))
        .chain(contrapositives(graph, table, &positions));
    for update in candidates {
        refine_target(graph, &update, ctx)?;
    }
    Ok(())
}

/// Matrix index → position in `graph.languages`.
fn language_positions(graph: &Graph) -> Vec<Option<usize>> {
    graph
        .adjacency_matrix
        .language_ids()
        .iter()
        .map(|id| graph.language_position(id))
        .collect()
}

fn status_of(language: &Language, op: &str) -> Status {
    effective(language.operations.get(op).map(|f| f.status))
}

fn lemma_upgrades(graph: &Graph, table: &LemmaTable) -> Vec<Update> {
    let mut out = Vec::new();
    for (position, lang) in graph.languages.iter().enumerate() {
        for lemma in &table.lemmas {
            let weakest = lemma
                .antecedents
                .iter()
                .try_fold(Tier::Poly, |acc, a| {
                    status_of(lang, a).guaranteed_tier().map(|t| acc.compose(t))
                });
            let Some(tier) = weakest else {
                continue;
            };
            let target = lemma.bound.apply(tier);
            if status_of(lang, &lemma.conclusion).guarantees(target) {
                continue;
            }
            let mut steps: Vec<ProofStep> = lemma
                .antecedents
                .iter()
                .map(|a| describe::operation_step(&lang.id, a, lang.operations.get(a)))
                .collect();
            steps.push(describe::lemma_step(lemma));
            out.push(Update {
                position,
                operation: lemma.conclusion.clone(),
                knowledge: Knowledge::holds(target),
                rule: Rule::Lemma {
                    lemma: lemma.id.clone(),
                },
                steps,
            });
        }
    }
    out
}

fn composition_upgrades(
    graph: &Graph,
    table: &LemmaTable,
    positions: &[Option<usize>],
) -> Vec<Update> {
    let matrix = &graph.adjacency_matrix;
    let mut out = Vec::new();
    for (i, j) in matrix.pairs() {
        let Some(edge_tier) = effective(matrix.status(i, j)).guaranteed_tier() else {
            continue;
        };
        let (Some(pi), Some(pj)) = (positions[i], positions[j]) else {
            continue;
        };
        let (source, target) = (&graph.languages[pi], &graph.languages[pj]);
        for (op, fact) in &target.operations {
            if !table.is_query(op) {
                continue;
            }
            let Some(op_tier) = fact.status.guaranteed_tier() else {
                continue;
            };
            let composed = edge_tier.compose(op_tier);
            if status_of(source, op).guarantees(composed) {
                continue;
            }
            out.push(Update {
                position: pi,
                operation: op.clone(),
                knowledge: Knowledge::holds(composed),
                rule: Rule::Composition,
                steps: vec![
                    edge_step(matrix, i, j),
                    describe::operation_step(&target.id, op, Some(fact)),
                ],
            });
        }
    }
    out
}

fn contrapositives(graph: &Graph, table: &LemmaTable, positions: &[Option<usize>]) -> Vec<Update> {
    let matrix = &graph.adjacency_matrix;
    let mut out = Vec::new();

    for (i, j) in matrix.pairs() {
        let Some(edge_tier) = effective(matrix.status(i, j)).guaranteed_tier() else {
            continue;
        };
        let (Some(pi), Some(pj)) = (positions[i], positions[j]) else {
            continue;
        };
        let (source, target) = (&graph.languages[pi], &graph.languages[pj]);
        for (op, fact) in &source.operations {
            if !table.is_query(op) {
                continue;
            }
            // e ∘ c is at best quasi unless both sides are polynomial.
            let tier = if fact.status.rules_out(Tier::Quasi) {
                Tier::Quasi
            } else if fact.status.rules_out(Tier::Poly) && edge_tier == Tier::Poly {
                Tier::Poly
            } else {
                continue;
            };
            if status_of(target, op).rules_out(tier) {
                continue;
            }
            out.push(Update {
                position: pj,
                operation: op.clone(),
                knowledge: Knowledge::fails(tier),
                rule: Rule::Contrapositive,
                steps: vec![
                    describe::operation_step(&source.id, op, Some(fact)),
                    edge_step(matrix, i, j),
                ],
            });
        }
    }

    for (position, lang) in graph.languages.iter().enumerate() {
        for lemma in &table.lemmas {
            let conclusion = status_of(lang, &lemma.conclusion);
            for tier in [Tier::Quasi, Tier::Poly] {
                if !conclusion.rules_out(lemma.bound.apply(tier)) {
                    continue;
                }
                let blockers: Vec<&String> = lemma
                    .antecedents
                    .iter()
                    .filter(|a| !status_of(lang, a).guarantees(tier))
                    .collect();
                let [blocker] = blockers.as_slice() else {
                    continue;
                };
                if status_of(lang, blocker).rules_out(tier) {
                    continue;
                }
                let mut steps = vec![
                    describe::operation_step(
                        &lang.id,
                        &lemma.conclusion,
                        lang.operations.get(&lemma.conclusion),
                    ),
                    describe::lemma_step(lemma),
                ];
                steps.extend(
                    lemma
                        .antecedents
                        .iter()
                        .filter(|a| *a != *blocker)
                        .map(|a| describe::operation_step(&lang.id, a, lang.operations.get(a))),
                );
                out.push(Update {
                    position,
                    operation: (*blocker).clone(),
                    knowledge: Knowledge::fails(tier),
                    rule: Rule::Contrapositive,
                    steps,
                });
            }
        }
    }
    out
}

/// Status the target would take, or the contradiction the update exposes.
fn refine_target(
    graph: &Graph,
    update: &Update,
    ctx: &PropagationContext,
) -> Result<(Status, Status), PropagationError> {
    let lang = &graph.languages[update.position];
    let fact = lang.operations.get(&update.operation);
    let current = effective(fact.map(|f| f.status));
    current.refine(update.knowledge).map(|after| (current, after)).map_err(|_| {
        let forced = derivation(lang, update, current);
        let existing = describe::operation_step(&lang.id, &update.operation, fact);
        PropagationError::OperationContradiction {
            language: lang.id.clone(),
            operation: update.operation.clone(),
            message: format!(
                "{} This contradicts {}.",
                render::derivation(&forced, &ctx.names),
                render::step(&existing, &ctx.names)
            ),
        }
    })
}

/// The derivation an update stands for; it concludes exactly its knowledge.
fn derivation(lang: &Language, update: &Update, fallback: Status) -> Derivation {
    let status =
        Status::from_axes(update.knowledge.poly, update.knowledge.quasi).unwrap_or(fallback);
    Derivation::new(
        describe::operation_claim(&lang.id, &update.operation, status),
        update.rule.clone(),
        update.steps.clone(),
    )
}

fn apply_all(
    graph: &mut Graph,
    updates: Vec<Update>,
    ctx: &PropagationContext,
) -> Result<usize, PropagationError> {
    let mut changed = 0;
    for update in updates {
        let (current, after) = refine_target(graph, &update, ctx)?;
        if after == current {
            continue;
        }
        let lang = &mut graph.languages[update.position];
        let fresh = derivation(lang, &update, after);
        let proof = match Half::kept_by(current) {
            Some(half) => {
                let existing = describe::existing_operation(
                    &lang.id,
                    &update.operation,
                    lang.operations.get(&update.operation),
                    half,
                );
                merge_proof(current, existing, after, fresh)
            }
            None => Proof::Single(fresh),
        };
        debug!(
            language = %lang.id,
            operation = %update.operation,
            before = %current,
            after = %after,
            "refined operation"
        );
        match lang.operations.get_mut(&update.operation) {
            Some(fact) => fact.set_derived(after, proof),
            None => {
                lang.operations
                    .insert(update.operation.clone(), OperationFact::derived(after, proof));
            }
        }
        changed += 1;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kcmap_model::DirectedRelation;

    fn graph(ops: &[(&str, &str, Status)]) -> Graph {
        let mut g = Graph::new(vec![Language::new("a", "A"), Language::new("b", "B")]);
        g.prepare().unwrap();
        for &(lang, op, s) in ops {
            g.assert_operation(lang, op, OperationFact::asserted(s)).unwrap();
        }
        g
    }

    fn run(g: &mut Graph) -> Result<usize, PropagationError> {
        let ctx = PropagationContext::new(g, Default::default());
        propagate_operations(g, &LemmaTable::standard(), &ctx)
    }

    #[test]
    fn lemma_uses_weakest_antecedent() {
        let mut g = graph(&[("a", "CD", Status::Poly), ("a", "CO", Status::UnknownPolyQuasi)]);
        run(&mut g).unwrap();
        let ce = g.operation("a", "CE").unwrap();
        assert_eq!(ce.status, Status::UnknownPolyQuasi);
        assert!(ce.derived);
        assert_eq!(ce.refs, vec!["darwiche-marquis-2002"]);
        // cd-co-me fires as well.
        assert_eq!(g.operation("a", "ME").unwrap().status, Status::UnknownPolyQuasi);
    }

    #[test]
    fn chained_lemmas_reach_a_fixed_point() {
        let mut g = graph(&[("a", "CT", Status::Poly), ("a", "CD", Status::Poly)]);
        let changes = run(&mut g).unwrap();
        for op in ["CO", "VA", "CE", "IM", "ME"] {
            assert_eq!(g.operation("a", op).unwrap().status, Status::Poly, "{op}");
        }
        assert_eq!(changes, 5);
        assert_eq!(run(&mut g).unwrap(), 0);
    }

    #[test]
    fn query_composes_along_edge() {
        let mut g = graph(&[("b", "CO", Status::Poly), ("b", "CD", Status::Poly)]);
        g.assert_relation("a", "b", Some(DirectedRelation::asserted(Status::UnknownPolyQuasi)))
            .unwrap();
        run(&mut g).unwrap();
        let co = g.operation("a", "CO").unwrap();
        assert_eq!(co.status, Status::UnknownPolyQuasi);
        assert!(matches!(co.proof, Some(Proof::Single(ref d)) if d.rule == Rule::Composition));
        // Transformations do not compose.
        assert!(g.operation("a", "CD").is_none());
    }

    #[test]
    fn composition_contrapositive_moves_negatives_forward() {
        let mut g = graph(&[("a", "CO", Status::NoPolyUnknownQuasi)]);
        g.assert_relation("a", "b", Some(DirectedRelation::asserted(Status::Poly)))
            .unwrap();
        run(&mut g).unwrap();
        let co = g.operation("b", "CO").unwrap();
        assert_eq!(co.status, Status::NoPolyUnknownQuasi);
        assert!(matches!(co.proof, Some(Proof::Single(ref d)) if d.rule == Rule::Contrapositive));
    }

    #[test]
    fn lemma_contrapositive_blames_the_only_open_antecedent() {
        // CD poly and CE not quasi: CO cannot be quasi (cd-co-ce).
        let mut g = graph(&[("a", "CD", Status::Poly), ("a", "CE", Status::NoQuasi)]);
        run(&mut g).unwrap();
        assert_eq!(g.operation("a", "CO").unwrap().status, Status::NoQuasi);
        // ... and therefore neither CT (ct-co) nor the things CO follows from.
        assert_eq!(g.operation("a", "CT").unwrap().status, Status::NoQuasi);
    }

    #[test]
    fn forced_fact_against_asserted_negative_is_a_contradiction() {
        let mut g = graph(&[("a", "CT", Status::Poly), ("a", "CO", Status::NoQuasi)]);
        let err = run(&mut g).unwrap_err();
        match err {
            PropagationError::OperationContradiction {
                language,
                operation,
                message,
            } => {
                assert_eq!(language, "a");
                assert_eq!(operation, "CO");
                assert!(message.contains("lemma ct-co"), "{message}");
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
