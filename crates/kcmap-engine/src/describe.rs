//! Builders for the derivations attached to derived facts.
//!
//! Every builder returns structured [`Derivation`]s; nothing here formats
//! text. References and caveats of the resulting facts are computed from
//! the steps (see `Derivation::refs` / `Derivation::caveat`).

use crate::validator::{path_steps, Violation};
use kcmap_model::{
    AdjacencyMatrix, Claim, Derivation, DirectedRelation, OperationFact, OperationLemma, Proof,
    ProofStep, Rule, Status,
};

/// `from → to` holds with `status` because every edge along `path` does.
pub fn transitive(matrix: &AdjacencyMatrix, path: &[usize], status: Status) -> Derivation {
    let (from, to) = endpoints(matrix, path);
    Derivation::new(
        Claim::edge(from, to, status),
        Rule::Transitivity,
        path_steps(matrix, path),
    )
}

fn endpoints<'m>(matrix: &'m AdjacencyMatrix, path: &[usize]) -> (&'m str, &'m str) {
    let first = path.first().copied().unwrap_or_default();
    let last = path.last().copied().unwrap_or(first);
    (matrix.id(first), matrix.id(last))
}

/// Supposing `hypothesis` leads to each of `violations`.
///
/// Every violation is an independent refutation, so the caveat of the
/// result is the OR over them. One branch is kept per distinct branch
/// caveat, which preserves that OR exactly; an unconditional branch makes
/// the others redundant.
pub fn refutation(hypothesis: Claim, conclusion: Claim, violations: &[Violation]) -> Derivation {
    let mut branches: Vec<Vec<ProofStep>> = Vec::new();
    let mut seen = Vec::new();
    for v in violations {
        let caveat = v.caveat();
        if seen.contains(&caveat) {
            continue;
        }
        let mut steps = v.chain.clone();
        steps.push(v.conflict.clone());
        if caveat.is_none() {
            branches = vec![steps];
            break;
        }
        seen.push(caveat);
        branches.push(steps);
    }
    Derivation {
        conclusion,
        rule: Rule::Refutation { hypothesis },
        branches,
    }
}

/// Justification of an existing relation, for keeping one half of a split proof.
pub fn existing_edge(
    from: &str,
    to: &str,
    relation: Option<&DirectedRelation>,
    half: Half,
) -> Option<Derivation> {
    let rel = relation?;
    let proof = rel.justification(|status| Claim::edge(from, to, status));
    let found = proof.as_ref().and_then(|p| half.of(p));
    Some(match found {
        Some(d) => d.clone(),
        None => Derivation::asserted(
            Claim::edge(from, to, rel.status),
            &rel.refs,
            rel.caveat.clone(),
        ),
    })
}

/// Same as [`existing_edge`], for operation facts.
pub fn existing_operation(
    language: &str,
    operation: &str,
    fact: Option<&OperationFact>,
    half: Half,
) -> Option<Derivation> {
    let fact = fact?;
    let proof = fact.justification(operation_claim(language, operation, fact.status));
    let found = proof.as_ref().and_then(|p| half.of(p));
    Some(match found {
        Some(d) => d.clone(),
        None => Derivation::asserted(
            operation_claim(language, operation, fact.status),
            &fact.refs,
            fact.caveat.clone(),
        ),
    })
}

/// Which half of a `no-poly-quasi` proof is being kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    NoPoly,
    Quasi,
}

impl Half {
    /// The half already justified by a fact with status `before`.
    pub fn kept_by(before: Status) -> Option<Half> {
        match before {
            Status::UnknownPolyQuasi => Some(Half::Quasi),
            Status::NoPolyUnknownQuasi => Some(Half::NoPoly),
            _ => None,
        }
    }

    fn of(self, proof: &Proof) -> Option<&Derivation> {
        match self {
            Half::NoPoly => proof.no_poly_part(),
            Half::Quasi => proof.quasi_part(),
        }
    }
}

pub fn operation_claim(language: &str, operation: &str, status: Status) -> Claim {
    Claim::Operation {
        language: language.to_string(),
        operation: operation.to_string(),
        status,
    }
}

pub fn operation_step(language: &str, operation: &str, fact: Option<&OperationFact>) -> ProofStep {
    match fact {
        Some(f) => ProofStep::new(operation_claim(language, operation, f.status))
            .with_refs(&f.refs)
            .with_caveat(f.caveat.clone()),
        None => ProofStep::new(operation_claim(language, operation, Status::UnknownBoth)),
    }
}

pub fn lemma_step(lemma: &OperationLemma) -> ProofStep {
    ProofStep::new(Claim::Lemma {
        id: lemma.id.clone(),
        statement: lemma.statement.clone(),
    })
    .with_refs(&lemma.refs)
    .with_caveat(lemma.caveat.clone())
}
