//! Structured derivations.
//!
//! Proofs are data: an ordered list of [`ProofStep`]s per branch, each with
//! its claim, citations and caveat. Text only appears when a proof is
//! rendered (see [`crate::render`]), so the reasoning core never formats
//! strings and proofs can be inspected in tests.

use crate::caveat::{self, Caveat};
use crate::status::Status;
use serde::{Deserialize, Serialize};

/// Something a proof step asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Claim {
    /// `from → to` holds with `status`.
    Edge {
        from: String,
        to: String,
        status: Status,
    },
    /// `language` supports `operation` with `status`.
    Operation {
        language: String,
        operation: String,
        status: Status,
    },
    /// An implication lemma from the lemma table.
    Lemma {
        id: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        statement: String,
    },
    /// Free text (asserted descriptions loaded from persisted data).
    Text { text: String },
}

impl Claim {
    pub fn edge(from: impl Into<String>, to: impl Into<String>, status: Status) -> Self {
        Claim::Edge {
            from: from.into(),
            to: to.into(),
            status,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Claim::Text { text: text.into() }
    }

    /// `true` for an edge claim on exactly `from → to`.
    pub fn is_edge(&self, from: &str, to: &str) -> bool {
        matches!(self, Claim::Edge { from: f, to: t, .. } if f == from && t == to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub claim: Claim,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caveat: Option<Caveat>,
}

impl ProofStep {
    pub fn new(claim: Claim) -> Self {
        Self {
            claim,
            refs: Vec::new(),
            caveat: None,
        }
    }

    pub fn with_refs(mut self, refs: &[String]) -> Self {
        self.refs = refs.to_vec();
        self
    }

    pub fn with_caveat(mut self, caveat: Option<Caveat>) -> Self {
        self.caveat = caveat;
        self
    }
}

/// The inference rule that turns a derivation's branches into its conclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// Stated directly; steps hold the cited description, if any.
    Asserted,
    /// The conclusion follows by composing the edges of the branch.
    Transitivity,
    /// Supposing `hypothesis`, each branch ends in a fact it contradicts.
    Refutation { hypothesis: Claim },
    /// An operation lemma applied to the antecedent facts of the branch.
    Lemma { lemma: String },
    /// Transform into another language, then run its query.
    Composition,
    /// The conclusion is forced by the contrapositive of a lemma or of a composition.
    Contrapositive,
}

/// One justified conclusion.
///
/// Each branch on its own suffices: the caveat of the derivation is the OR
/// over branches of the AND over each branch's steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    pub conclusion: Claim,
    #[serde(flatten)]
    pub rule: Rule,
    pub branches: Vec<Vec<ProofStep>>,
}

impl Derivation {
    pub fn new(conclusion: Claim, rule: Rule, steps: Vec<ProofStep>) -> Self {
        Self {
            conclusion,
            rule,
            branches: vec![steps],
        }
    }

    /// Placeholder justification for an asserted fact that came with no text.
    pub fn asserted(conclusion: Claim, refs: &[String], caveat: Option<Caveat>) -> Self {
        Self::new(
            conclusion.clone(),
            Rule::Asserted,
            vec![ProofStep::new(conclusion)
                .with_refs(refs)
                .with_caveat(caveat)],
        )
    }

    /// An asserted fact justified by persisted free text.
    pub fn stated(conclusion: Claim, text: &str, refs: &[String], caveat: Option<Caveat>) -> Self {
        Self::new(
            conclusion,
            Rule::Asserted,
            vec![ProofStep::new(Claim::text(text))
                .with_refs(refs)
                .with_caveat(caveat)],
        )
    }

    /// Union of citations over every step of every branch, first-seen order.
    pub fn refs(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for step in self.branches.iter().flatten() {
            for r in &step.refs {
                if !out.contains(r) {
                    out.push(r.clone());
                }
            }
        }
        out
    }

    pub fn caveat(&self) -> Option<Caveat> {
        caveat::disjoin_all(self.branches.iter().map(|steps| {
            caveat::conjoin_all(steps.iter().map(|step| step.caveat.clone()))
        }))
    }
}

/// Proof stored on a relation or operation fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proof {
    Single(Derivation),
    /// `no-poly-quasi`: the two halves are justified independently.
    Split {
        no_poly: Derivation,
        quasi: Derivation,
    },
}

impl Proof {
    /// Justification of the "not polynomial" half, when the proof has one.
    pub fn no_poly_part(&self) -> Option<&Derivation> {
        match self {
            Proof::Split { no_poly, .. } => Some(no_poly),
            Proof::Single(d) => match &d.conclusion {
                Claim::Edge { status, .. } | Claim::Operation { status, .. }
                    if status.poly() == Some(false) =>
                {
                    Some(d)
                }
                _ => None,
            },
        }
    }

    /// Justification of the "quasi-polynomial exists" half, when the proof has one.
    pub fn quasi_part(&self) -> Option<&Derivation> {
        match self {
            Proof::Split { quasi, .. } => Some(quasi),
            Proof::Single(d) => match &d.conclusion {
                Claim::Edge { status, .. } | Claim::Operation { status, .. }
                    if status.quasi() == Some(true) =>
                {
                    Some(d)
                }
                _ => None,
            },
        }
    }

    pub fn derivations(&self) -> Vec<&Derivation> {
        match self {
            Proof::Single(d) => vec![d],
            Proof::Split { no_poly, quasi } => vec![no_poly, quasi],
        }
    }

    pub fn refs(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for d in self.derivations() {
            for r in d.refs() {
                if !out.contains(&r) {
                    out.push(r);
                }
            }
        }
        out
    }

    /// Both halves of a split proof are needed, so their caveats conjoin.
    pub fn caveat(&self) -> Option<Caveat> {
        caveat::conjoin_all(self.derivations().into_iter().map(Derivation::caveat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(from: &str, to: &str, refs: &[&str], caveat: Option<&str>) -> ProofStep {
        ProofStep::new(Claim::edge(from, to, Status::Poly))
            .with_refs(&refs.iter().map(|r| r.to_string()).collect::<Vec<_>>())
            .with_caveat(caveat.map(Caveat::assumption))
    }

    #[test]
    fn refs_union_keeps_first_seen_order() {
        let d = Derivation::new(
            Claim::edge("a", "c", Status::Poly),
            Rule::Transitivity,
            vec![step("a", "b", &["r2", "r1"], None), step("b", "c", &["r1", "r3"], None)],
        );
        assert_eq!(d.refs(), vec!["r2", "r1", "r3"]);
    }

    #[test]
    fn branch_caveats_are_or_of_and() {
        let mut d = Derivation::new(
            Claim::edge("a", "c", Status::NoPolyUnknownQuasi),
            Rule::Refutation {
                hypothesis: Claim::edge("a", "c", Status::Poly),
            },
            vec![step("a", "b", &[], Some("x")), step("b", "c", &[], Some("y"))],
        );
        d.branches.push(vec![step("a", "d", &[], Some("z"))]);
        assert_eq!(d.caveat().unwrap().to_string(), "z or (x and y)");

        d.branches.push(vec![step("a", "e", &[], None)]);
        assert_eq!(d.caveat(), None);
    }

    #[test]
    fn split_proof_halves_stay_retrievable() {
        let quasi = Derivation::asserted(
            Claim::edge("a", "b", Status::UnknownPolyQuasi),
            &["q".to_string()],
            None,
        );
        let no_poly = Derivation::asserted(
            Claim::edge("a", "b", Status::NoPolyUnknownQuasi),
            &["n".to_string()],
            Some(Caveat::assumption("P != NP")),
        );
        let proof = Proof::Split {
            no_poly: no_poly.clone(),
            quasi: quasi.clone(),
        };
        assert_eq!(proof.no_poly_part(), Some(&no_poly));
        assert_eq!(proof.quasi_part(), Some(&quasi));
        assert_eq!(proof.refs(), vec!["n", "q"]);
        assert_eq!(proof.caveat(), Some(Caveat::assumption("P != NP")));
    }

    #[test]
    fn derivation_serializes_rule_inline() {
        let d = Derivation::new(
            Claim::edge("a", "b", Status::Poly),
            Rule::Lemma {
                lemma: "ct-co".into(),
            },
            vec![],
        );
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["rule"], "lemma");
        assert_eq!(json["lemma"], "ct-co");
        let back: Derivation = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
