//! Facts stored in the graph: directed succinctness relations between two
//! languages, and operation-support facts on a single language.

use crate::caveat::Caveat;
use crate::proof::{Claim, Derivation, Proof};
use crate::status::Status;
use serde::{Deserialize, Serialize};

/// Label on the directed pair `A → B` ("A transforms into B within ...").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectedRelation {
    pub status: Status,
    #[serde(default)]
    pub refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caveat: Option<Caveat>,
    #[serde(default)]
    pub derived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
    /// Separating-function witnesses, carried through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub separating_functions: Vec<serde_json::Value>,
    /// Display-only flag owned by the rendering layer.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    /// Free-text justification of an asserted relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text justifications of the two halves of `no-poly-quasi`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_poly_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quasi_description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DirectedRelation {
    /// An asserted relation with no citations.
    pub fn asserted(status: Status) -> Self {
        Self {
            status,
            refs: Vec::new(),
            caveat: None,
            derived: false,
            proof: None,
            separating_functions: Vec::new(),
            hidden: false,
            description: None,
            no_poly_description: None,
            quasi_description: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn with_refs<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refs = refs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_caveat(mut self, caveat: impl Into<String>) -> Self {
        self.caveat = Some(Caveat::assumption(caveat));
        self
    }

    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.proof = Some(proof);
        self
    }

    /// A freshly derived relation; citations and caveat come from the proof.
    pub fn derived(status: Status, proof: Proof) -> Self {
        let mut rel = Self::asserted(status);
        rel.set_derived(status, proof);
        rel
    }

    /// Overwrite status and proof in place, keeping witnesses and display flags.
    ///
    /// Persisted descriptions are dropped: whatever part of them still
    /// holds was folded into `proof` by the caller.
    pub fn set_derived(&mut self, status: Status, proof: Proof) {
        self.status = status;
        self.refs = proof.refs();
        self.caveat = proof.caveat();
        self.proof = Some(proof);
        self.derived = true;
        self.description = None;
        self.no_poly_description = None;
        self.quasi_description = None;
    }

    /// The structured proof, or the one the persisted descriptions amount to.
    ///
    /// `claim` builds this relation's claim for a given status.
    pub fn justification(&self, claim: impl Fn(Status) -> Claim) -> Option<Proof> {
        if let Some(proof) = &self.proof {
            return Some(proof.clone());
        }
        let stated = |status: Status, text: &Option<String>| match text {
            Some(text) => Derivation::stated(claim(status), text, &self.refs, self.caveat.clone()),
            None => Derivation::asserted(claim(status), &self.refs, self.caveat.clone()),
        };
        if self.status == Status::NoPolyQuasi
            && (self.no_poly_description.is_some() || self.quasi_description.is_some())
        {
            return Some(Proof::Split {
                no_poly: stated(Status::NoPolyUnknownQuasi, &self.no_poly_description),
                quasi: stated(Status::UnknownPolyQuasi, &self.quasi_description),
            });
        }
        let text = self
            .description
            .as_ref()
            .or(self.no_poly_description.as_ref())
            .or(self.quasi_description.as_ref())?;
        Some(Proof::Single(Derivation::stated(
            claim(self.status),
            text,
            &self.refs,
            self.caveat.clone(),
        )))
    }
}

/// Support of one operation (query or transformation) by one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationFact {
    pub status: Status,
    #[serde(default)]
    pub refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caveat: Option<Caveat>,
    #[serde(default)]
    pub derived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OperationFact {
    pub fn asserted(status: Status) -> Self {
        Self {
            status,
            refs: Vec::new(),
            caveat: None,
            derived: false,
            proof: None,
            description: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_refs<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refs = refs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_caveat(mut self, caveat: impl Into<String>) -> Self {
        self.caveat = Some(Caveat::assumption(caveat));
        self
    }

    pub fn derived(status: Status, proof: Proof) -> Self {
        let mut fact = Self::asserted(status);
        fact.set_derived(status, proof);
        fact
    }

    pub fn set_derived(&mut self, status: Status, proof: Proof) {
        self.status = status;
        self.refs = proof.refs();
        self.caveat = proof.caveat();
        self.proof = Some(proof);
        self.derived = true;
        self.description = None;
    }

    /// The structured proof, or the persisted description as an asserted one.
    pub fn justification(&self, claim: Claim) -> Option<Proof> {
        match (&self.proof, &self.description) {
            (Some(proof), _) => Some(proof.clone()),
            (None, Some(text)) => Some(Proof::Single(Derivation::stated(
                claim,
                text,
                &self.refs,
                self.caveat.clone(),
            ))),
            (None, None) => None,
        }
    }
}

/// Combine the proof a fact already has with a derivation of new knowledge.
///
/// Moving to `no-poly-quasi` from one of its halves keeps the existing half
/// and files the new derivation under the other one, so either half can be
/// refined later without losing its partner. Everything else is replaced
/// by the new derivation.
pub fn merge_proof(
    before: Status,
    existing: Option<Derivation>,
    after: Status,
    fresh: Derivation,
) -> Proof {
    match (before, after, existing) {
        (Status::UnknownPolyQuasi, Status::NoPolyQuasi, Some(quasi)) => Proof::Split {
            no_poly: fresh,
            quasi,
        },
        (Status::NoPolyUnknownQuasi, Status::NoPolyQuasi, Some(no_poly)) => Proof::Split {
            no_poly,
            quasi: fresh,
        },
        _ => Proof::Single(fresh),
    }
}
