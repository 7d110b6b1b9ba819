//! Text rendering of structured proofs (the presentation boundary).

use crate::caveat::Caveat;
use crate::language::NameResolver;
use crate::proof::{Claim, Derivation, Proof, ProofStep, Rule};

pub fn claim(claim: &Claim, names: &NameResolver) -> String {
    match claim {
        Claim::Edge { from, to, status } => format!(
            "{} → {} is {}",
            names.name(from),
            names.name(to),
            status.phrase()
        ),
        Claim::Operation {
            language,
            operation,
            status,
        } => format!("{operation} on {} is {}", names.name(language), status.phrase()),
        Claim::Lemma { id, statement } if statement.is_empty() => format!("lemma {id}"),
        Claim::Lemma { id, statement } => format!("lemma {id} ({statement})"),
        Claim::Text { text } => text.clone(),
    }
}

/// `" [a, b]"`, or nothing for an empty list.
pub fn citations(refs: &[String]) -> String {
    if refs.is_empty() {
        String::new()
    } else {
        format!(" [{}]", refs.join(", "))
    }
}

fn assuming(caveat: &Option<Caveat>) -> String {
    match caveat {
        Some(c) => format!(" (assuming {c})"),
        None => String::new(),
    }
}

pub fn step(step: &ProofStep, names: &NameResolver) -> String {
    format!(
        "{}{}{}",
        claim(&step.claim, names),
        citations(&step.refs),
        assuming(&step.caveat)
    )
}

fn steps(list: &[ProofStep], names: &NameResolver) -> String {
    list.iter()
        .map(|s| step(s, names))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn derivation(d: &Derivation, names: &NameResolver) -> String {
    let conclusion = claim(&d.conclusion, names);
    let branches: Vec<String> = d
        .branches
        .iter()
        .map(|branch| match &d.rule {
            Rule::Asserted => match branch.as_slice() {
                [only] if matches!(only.claim, Claim::Text { .. }) => step(only, names),
                _ => format!("{conclusion} (asserted){}", citations(&d.refs())),
            },
            Rule::Transitivity => format!("{conclusion} by transitivity: {}.", steps(branch, names)),
            Rule::Refutation { hypothesis } => refutation(hypothesis, branch, names),
            Rule::Lemma { .. } => format!("{conclusion} by {}.", steps(branch, names)),
            Rule::Composition => format!(
                "{conclusion}: transform, then query: {}.",
                steps(branch, names)
            ),
            Rule::Contrapositive => format!(
                "{conclusion} by contraposition: {}.",
                steps(branch, names)
            ),
        })
        .collect();
    branches.join(" Alternatively: ")
}

fn refutation(hypothesis: &Claim, branch: &[ProofStep], names: &NameResolver) -> String {
    let suppose = claim(hypothesis, names);
    match branch.split_last() {
        Some((conflict, chain)) if !chain.is_empty() => format!(
            "Suppose {suppose}. Then {} would follow, contradicting {}.",
            steps(chain, names),
            step(conflict, names)
        ),
        Some((conflict, _)) => format!("Suppose {suppose}. This contradicts {}.", step(conflict, names)),
        None => format!("Supposing {suppose} is inconsistent."),
    }
}

pub fn proof(p: &Proof, names: &NameResolver) -> String {
    match p {
        Proof::Single(d) => derivation(d, names),
        Proof::Split { no_poly, quasi } => format!(
            "No polynomial transformation: {} Quasi-polynomial transformation: {}",
            derivation(no_poly, names),
            derivation(quasi, names)
        ),
    }
}
