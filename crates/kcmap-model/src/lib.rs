//! KC map data model
//!
//! The knowledge-compilation map is a directed graph whose nodes are
//! representation languages and whose edges record how one language
//! transforms into another:
//!
//! ```text
//!   Language ──[DirectedRelation: status, refs, caveat, proof]──► Language
//!      │
//!      └── operations: { "CO": OperationFact, "CD": OperationFact, ... }
//! ```
//!
//! This crate holds the types only; the inference engine lives in
//! `kcmap-engine`.
//!
//! ## Module Organization
//!
//! - `status`: the six-valued poly/quasi guarantee lattice
//! - `caveat`: conditional assumptions with AND/OR merging
//! - `proof`: structured derivations (claims, steps, branches)
//! - `relation`, `language`, `matrix`, `graph`: the persisted shape
//! - `lemma`: operation catalog and implication lemmas
//! - `render`: proof → text

pub mod caveat;
pub mod graph;
pub mod language;
pub mod lemma;
pub mod matrix;
pub mod proof;
pub mod relation;
pub mod render;
pub mod status;

pub use caveat::Caveat;
pub use graph::Graph;
pub use language::{Language, NameResolver};
pub use lemma::{LemmaTable, OperationKind, OperationLemma, TierMap};
pub use matrix::AdjacencyMatrix;
pub use proof::{Claim, Derivation, Proof, ProofStep, Rule};
pub use relation::{DirectedRelation, OperationFact};
pub use status::{Knowledge, Status, Tier};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("adjacency matrix does not match its {languages} language ids (found {rows} entries{})",
        .row.map(|r| format!(" in row {r}")).unwrap_or_default())]
    Shape {
        languages: usize,
        rows: usize,
        row: Option<usize>,
    },

    #[error("language id `{0}` appears more than once")]
    DuplicateLanguage(String),

    #[error("unknown language id `{0}`")]
    UnknownLanguage(String),

    #[error("relation `{0}` → `{0}` is on the diagonal")]
    Diagonal(String),
}
