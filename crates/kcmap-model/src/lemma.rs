//! Static implication lemmas over operation support.
//!
//! A lemma reads: "a language supporting every antecedent operation at
//! tier ≤ c supports the conclusion at tier ≤ f(c)". The table is input
//! to the engine and is never mutated by it.

use crate::caveat::Caveat;
use crate::status::Tier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Queries answer a question about a compiled form; transformations
/// produce a new compiled form in the same language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Query,
    Transformation,
}

/// How the antecedent tier bounds the conclusion tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierMap {
    /// f(c) = c
    #[default]
    Same,
    /// f(c) = quasi, whatever c is.
    Quasi,
}

impl TierMap {
    pub fn apply(self, tier: Tier) -> Tier {
        match self {
            TierMap::Same => tier,
            TierMap::Quasi => Tier::Quasi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLemma {
    pub id: String,
    pub antecedents: Vec<String>,
    pub conclusion: String,
    #[serde(default)]
    pub bound: TierMap,
    #[serde(default)]
    pub refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caveat: Option<Caveat>,
    /// One-line statement shown in rendered proofs.
    #[serde(default)]
    pub statement: String,
}

impl OperationLemma {
    pub fn new(id: &str, antecedents: &[&str], conclusion: &str, statement: &str) -> Self {
        Self {
            id: id.to_string(),
            antecedents: antecedents.iter().map(|a| a.to_string()).collect(),
            conclusion: conclusion.to_string(),
            bound: TierMap::Same,
            refs: vec![DARWICHE_MARQUIS.to_string()],
            caveat: None,
            statement: statement.to_string(),
        }
    }
}

const DARWICHE_MARQUIS: &str = "darwiche-marquis-2002";

const QUERIES: [&str; 8] = ["CO", "VA", "CE", "IM", "EQ", "SE", "CT", "ME"];
const TRANSFORMATIONS: [&str; 8] = ["CD", "FO", "SFO", "AND", "ANDB", "OR", "ORB", "NOT"];

/// Operation catalog plus lemmas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LemmaTable {
    #[serde(default)]
    pub operations: BTreeMap<String, OperationKind>,
    #[serde(default)]
    pub lemmas: Vec<OperationLemma>,
}

impl LemmaTable {
    /// The standard knowledge-compilation-map queries, transformations and
    /// the textbook reductions between them.
    pub fn standard() -> Self {
        let mut operations = BTreeMap::new();
        for q in QUERIES {
            operations.insert(q.to_string(), OperationKind::Query);
        }
        for t in TRANSFORMATIONS {
            operations.insert(t.to_string(), OperationKind::Transformation);
        }

        let lemmas = vec![
            OperationLemma::new("ct-co", &["CT"], "CO", "a formula is consistent iff its model count is positive"),
            OperationLemma::new("ct-va", &["CT"], "VA", "a formula is valid iff its model count is 2^n"),
            OperationLemma::new("ce-co", &["CE"], "CO", "a formula is consistent iff it does not entail the empty clause"),
            OperationLemma::new("im-va", &["IM"], "VA", "a formula is valid iff the empty term implies it"),
            OperationLemma::new("cd-co-ce", &["CD", "CO"], "CE", "φ entails clause c iff φ conditioned on ¬c is inconsistent"),
            OperationLemma::new("cd-va-im", &["CD", "VA"], "IM", "term t implies φ iff φ conditioned on t is valid"),
            OperationLemma::new("cd-co-me", &["CD", "CO"], "ME", "models are enumerated by branching on conditioning and pruning inconsistent branches"),
            OperationLemma::new("se-eq", &["SE"], "EQ", "equivalence is entailment in both directions"),
            OperationLemma::new("not-co-va", &["NOT", "CO"], "VA", "φ is valid iff ¬φ is inconsistent"),
            OperationLemma::new("not-va-co", &["NOT", "VA"], "CO", "φ is consistent iff ¬φ is not valid"),
        ];

        Self { operations, lemmas }
    }

    pub fn kind(&self, op: &str) -> Option<OperationKind> {
        self.operations.get(op).copied()
    }

    /// Only catalogued queries compose with a succinctness transformation;
    /// a transformation's output would live in the target language.
    pub fn is_query(&self, op: &str) -> bool {
        self.kind(op) == Some(OperationKind::Query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_well_formed() {
        let table = LemmaTable::standard();
        for lemma in &table.lemmas {
            assert!(table.kind(&lemma.conclusion).is_some(), "{}", lemma.id);
            for a in &lemma.antecedents {
                assert!(table.kind(a).is_some(), "{} uses {a}", lemma.id);
            }
        }
        assert!(table.is_query("CT"));
        assert!(!table.is_query("CD"));
        assert_eq!(table.lemmas.iter().filter(|l| l.conclusion == "CO").count(), 3);
    }

    #[test]
    fn lemma_json_defaults() {
        let lemma: OperationLemma = serde_json::from_str(
            r#"{"id": "x", "antecedents": ["CD"], "conclusion": "CO", "bound": "quasi"}"#,
        )
        .unwrap();
        assert_eq!(lemma.bound.apply(Tier::Poly), Tier::Quasi);
        assert!(lemma.refs.is_empty());
        assert_eq!(TierMap::default().apply(Tier::Poly), Tier::Poly);
    }
}
