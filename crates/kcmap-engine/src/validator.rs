//! Whole-graph consistency checking.
//!
//! The downgrade pass is only as strong as the validator it is given: a
//! speculative edge is rejected exactly when the validator finds a
//! violation, so the validator must be sound and total over the entire
//! current graph, not only the edge under test.

use crate::reachability::{Reachability, ReachabilityPair};
use kcmap_model::caveat::{self, Caveat};
use kcmap_model::render;
use kcmap_model::{
    AdjacencyMatrix, Claim, Graph, Language, LemmaTable, NameResolver, ProofStep, Tier,
};
use std::collections::BTreeSet;

/// External collaborator: is the graph as a whole free of contradictions?
pub trait ConsistencyValidator {
    fn validate(&self, graph: &Graph) -> anyhow::Result<ValidationReport>;
}

impl<V: ConsistencyValidator + ?Sized> ConsistencyValidator for &V {
    fn validate(&self, graph: &Graph) -> anyhow::Result<ValidationReport> {
        (**self).validate(graph)
    }
}

/// One pair of incompatible facts.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The guarantee the chain forces and the conflicting fact rules out.
    pub tier: Tier,
    /// Language ids from the chain's source to its target.
    pub witness_path: Vec<String>,
    /// The facts that force the guarantee, in path order.
    pub chain: Vec<ProofStep>,
    /// The asserted or derived fact that rules the guarantee out.
    pub conflict: ProofStep,
    pub message: String,
}

impl Violation {
    /// The violation holds under every assumption of its chain and conflict.
    pub fn caveat(&self) -> Option<Caveat> {
        caveat::conjoin_all(
            self.chain
                .iter()
                .chain(std::iter::once(&self.conflict))
                .map(|step| step.caveat.clone()),
        )
    }

    /// `true` when the edge `from → to` is one of the facts involved.
    pub fn involves_edge(&self, from: &str, to: &str) -> bool {
        self.conflict.claim.is_edge(from, to)
            || self.chain.iter().any(|step| step.claim.is_edge(from, to))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Message of the first violation.
    pub fn error(&self) -> Option<&str> {
        self.violations.first().map(|v| v.message.as_str())
    }

    /// Witness path of the first violation.
    pub fn witness_path(&self) -> Option<&[String]> {
        self.violations.first().map(|v| v.witness_path.as_slice())
    }
}

/// The built-in validator.
///
/// Checks, in row-major pair order:
/// 1. a polynomial (quasi-polynomial) path from A to B against an A → B
///    fact that rules polynomial (quasi-polynomial) out;
/// 2. query composition: when A reaches B and B answers query X at some
///    tier, A cannot rule X out at the composed tier.
#[derive(Debug, Clone)]
pub struct ReachabilityValidator {
    queries: BTreeSet<String>,
}

impl ReachabilityValidator {
    pub fn new(table: &LemmaTable) -> Self {
        let queries = table
            .operations
            .keys()
            .filter(|op| table.is_query(op))
            .cloned()
            .collect();
        Self { queries }
    }

    /// Validate edges only, ignoring operation facts.
    pub fn edges_only() -> Self {
        Self {
            queries: BTreeSet::new(),
        }
    }
}

impl Default for ReachabilityValidator {
    fn default() -> Self {
        Self::new(&LemmaTable::standard())
    }
}

impl ConsistencyValidator for ReachabilityValidator {
    fn validate(&self, graph: &Graph) -> anyhow::Result<ValidationReport> {
        let matrix = &graph.adjacency_matrix;
        let names = graph.names();
        let reach = ReachabilityPair::compute(matrix);
        let mut report = ValidationReport::default();

        for (i, j) in matrix.pairs() {
            let Some(rel) = matrix.get(i, j) else {
                continue;
            };
            let forced = if reach.poly.reaches(i, j) && rel.status.rules_out(Tier::Poly) {
                Some((Tier::Poly, &reach.poly))
            } else if reach.quasi.reaches(i, j) && rel.status.rules_out(Tier::Quasi) {
                Some((Tier::Quasi, &reach.quasi))
            } else {
                None
            };
            if let Some((tier, witness)) = forced {
                let path = witness.ensure_path(i, j);
                let chain = path_steps(matrix, &path);
                let conflict = edge_step(matrix, i, j);
                let message = format!(
                    "{} gives a {tier} transformation from {} to {}, contradicting {}",
                    path_names(matrix, &path, &names),
                    names.name(matrix.id(i)),
                    names.name(matrix.id(j)),
                    render::step(&conflict, &names),
                );
                report.violations.push(Violation {
                    tier,
                    witness_path: path_ids(matrix, &path),
                    chain,
                    conflict,
                    message,
                });
            }
        }

        if !self.queries.is_empty() {
            self.check_composition(graph, &reach, &names, &mut report);
        }

        Ok(report)
    }
}

impl ReachabilityValidator {
    fn check_composition(
        &self,
        graph: &Graph,
        reach: &ReachabilityPair,
        names: &NameResolver,
        report: &mut ValidationReport,
    ) {
        let matrix = &graph.adjacency_matrix;
        let langs: Vec<Option<&Language>> = matrix
            .language_ids()
            .iter()
            .map(|id| graph.language(id))
            .collect();

        for (i, j) in matrix.pairs() {
            if !reach.quasi.reaches(i, j) {
                continue;
            }
            let (Some(source), Some(target)) = (langs[i], langs[j]) else {
                continue;
            };
            let (edge_tier, witness): (Tier, &Reachability) = if reach.poly.reaches(i, j) {
                (Tier::Poly, &reach.poly)
            } else {
                (Tier::Quasi, &reach.quasi)
            };

            for (op, target_fact) in &target.operations {
                if !self.queries.contains(op) {
                    continue;
                }
                let Some(op_tier) = target_fact.status.guaranteed_tier() else {
                    continue;
                };
                let Some(source_fact) = source.operations.get(op) else {
                    continue;
                };
                let composed = edge_tier.compose(op_tier);
                if !source_fact.status.rules_out(composed) {
                    continue;
                }

                let path = witness.ensure_path(i, j);
                let mut chain = path_steps(matrix, &path);
                chain.push(
                    ProofStep::new(Claim::Operation {
                        language: target.id.clone(),
                        operation: op.clone(),
                        status: target_fact.status,
                    })
                    .with_refs(&target_fact.refs)
                    .with_caveat(target_fact.caveat.clone()),
                );
                let conflict = ProofStep::new(Claim::Operation {
                    language: source.id.clone(),
                    operation: op.clone(),
                    status: source_fact.status,
                })
                .with_refs(&source_fact.refs)
                .with_caveat(source_fact.caveat.clone());
                let message = format!(
                    "{} and {op} on {} give {op} on {} in {composed} time, contradicting {}",
                    path_names(matrix, &path, names),
                    names.name(&target.id),
                    names.name(&source.id),
                    render::step(&conflict, names),
                );
                report.violations.push(Violation {
                    tier: composed,
                    witness_path: path_ids(matrix, &path),
                    chain,
                    conflict,
                    message,
                });
            }
        }
    }
}

/// Proof step for the current fact on `i → j` (unknown when absent).
pub(crate) fn edge_step(matrix: &AdjacencyMatrix, i: usize, j: usize) -> ProofStep {
    let claim = Claim::edge(
        matrix.id(i),
        matrix.id(j),
        kcmap_model::status::effective(matrix.status(i, j)),
    );
    match matrix.get(i, j) {
        Some(rel) => ProofStep::new(claim)
            .with_refs(&rel.refs)
            .with_caveat(rel.caveat.clone()),
        None => ProofStep::new(claim),
    }
}

/// One edge step per consecutive pair of `path`.
pub(crate) fn path_steps(matrix: &AdjacencyMatrix, path: &[usize]) -> Vec<ProofStep> {
    path.windows(2)
        .map(|w| edge_step(matrix, w[0], w[1]))
        .collect()
}

fn path_ids(matrix: &AdjacencyMatrix, path: &[usize]) -> Vec<String> {
    path.iter().map(|&i| matrix.id(i).to_string()).collect()
}

fn path_names(matrix: &AdjacencyMatrix, path: &[usize], names: &NameResolver) -> String {
    let steps: Vec<String> = path
        .windows(2)
        .map(|w| format!("{} → {}", names.name(matrix.id(w[0])), names.name(matrix.id(w[1]))))
        .collect();
    steps.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kcmap_model::{DirectedRelation, OperationFact, Status};

    fn graph(ids: &[&str]) -> Graph {
        let mut g = Graph::new(
            ids.iter()
                .map(|id| Language::new(*id, id.to_uppercase()))
                .collect(),
        );
        g.prepare().unwrap();
        g
    }

    #[test]
    fn empty_graph_is_consistent() {
        let g = graph(&["x", "y"]);
        let report = ReachabilityValidator::default().validate(&g).unwrap();
        assert!(report.ok());
        assert_eq!(report.error(), None);
    }

    #[test]
    fn transitive_poly_against_no_poly() {
        let mut g = graph(&["x", "y", "z"]);
        g.assert_relation("x", "y", Some(DirectedRelation::asserted(Status::Poly).with_refs(["r1"])))
            .unwrap();
        g.assert_relation("y", "z", Some(DirectedRelation::asserted(Status::Poly).with_refs(["r2"])))
            .unwrap();
        g.assert_relation(
            "x",
            "z",
            Some(DirectedRelation::asserted(Status::NoPolyQuasi).with_caveat("P != NP")),
        )
        .unwrap();

        let report = ReachabilityValidator::default().validate(&g).unwrap();
        assert!(!report.ok());
        assert_eq!(report.violations.len(), 1);
        let v = &report.violations[0];
        assert_eq!(v.tier, Tier::Poly);
        assert_eq!(report.witness_path().unwrap(), &["x", "y", "z"]);
        assert!(v.involves_edge("y", "z"));
        assert_eq!(v.caveat(), Some(Caveat::assumption("P != NP")));
        let msg = report.error().unwrap();
        assert!(msg.contains("X → Y, Y → Z"), "{msg}");
    }

    #[test]
    fn query_composition_conflict() {
        let mut g = graph(&["x", "y"]);
        g.assert_relation("x", "y", Some(DirectedRelation::asserted(Status::Poly)))
            .unwrap();
        g.assert_operation("y", "CO", OperationFact::asserted(Status::Poly))
            .unwrap();
        g.assert_operation("x", "CO", OperationFact::asserted(Status::NoPolyUnknownQuasi))
            .unwrap();

        let report = ReachabilityValidator::default().validate(&g).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].tier, Tier::Poly);

        let edges_only = ReachabilityValidator::edges_only().validate(&g).unwrap();
        assert!(edges_only.ok());
    }

    #[test]
    fn transformations_do_not_compose() {
        let mut g = graph(&["x", "y"]);
        g.assert_relation("x", "y", Some(DirectedRelation::asserted(Status::Poly)))
            .unwrap();
        g.assert_operation("y", "CD", OperationFact::asserted(Status::Poly))
            .unwrap();
        g.assert_operation("x", "CD", OperationFact::asserted(Status::NoQuasi))
            .unwrap();
        assert!(ReachabilityValidator::default().validate(&g).unwrap().ok());
    }
}
