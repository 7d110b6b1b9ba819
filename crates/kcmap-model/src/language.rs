//! Languages (graph nodes) and the id → display-name resolver.

use crate::relation::OperationFact;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A knowledge-representation language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: String,
    pub name: String,
    /// Operation code (e.g. `"CO"`, `"CD"`) → support fact.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub operations: BTreeMap<String, OperationFact>,
    /// Fields the engine does not interpret (definitions, tags, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Language {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            operations: BTreeMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_operation(mut self, op: impl Into<String>, fact: OperationFact) -> Self {
        self.operations.insert(op.into(), fact);
        self
    }
}

/// Resolves language ids to display names for rendered proofs.
///
/// Built per propagation call from the current language list; unknown ids
/// render as themselves.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    names: AHashMap<String, String>,
}

impl NameResolver {
    pub fn from_languages(languages: &[Language]) -> Self {
        let names = languages
            .iter()
            .map(|lang| (lang.id.clone(), lang.name.clone()))
            .collect();
        Self { names }
    }

    pub fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
