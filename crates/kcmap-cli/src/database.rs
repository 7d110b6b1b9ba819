//! The persisted database document.
//!
//! ```json
//! { "languages": [...], "references": [...], "separatingFunctions": [...],
//!   "adjacencyMatrix": { "languageIds": [...], "matrix": [[null, {...}], ...] } }
//! ```
//!
//! Top-level keys the tool does not interpret are kept as they are.

use anyhow::{Context, Result};
use kcmap_model::{AdjacencyMatrix, Graph, Language};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub references: Vec<serde_json::Value>,
    #[serde(default)]
    pub separating_functions: Vec<serde_json::Value>,
    #[serde(default)]
    pub adjacency_matrix: Option<AdjacencyMatrix>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Database {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Move languages and relations out as a graph; a missing matrix is empty.
    pub fn take_graph(&mut self) -> Graph {
        let languages = std::mem::take(&mut self.languages);
        let adjacency_matrix = self.adjacency_matrix.take().unwrap_or_else(|| {
            AdjacencyMatrix::empty(languages.iter().map(|l| l.id.clone()).collect())
        });
        Graph {
            languages,
            adjacency_matrix,
        }
    }

    pub fn put_graph(&mut self, graph: Graph) {
        self.languages = graph.languages;
        self.adjacency_matrix = Some(graph.adjacency_matrix);
    }

    /// Reset every relation to null, keeping the languages.
    pub fn clear_relations(&mut self) {
        let mut graph = self.take_graph();
        graph.clear_relations();
        self.put_graph(graph);
    }

    /// Empty every mutable dataset, leaving a well-formed empty document.
    pub fn clear_all(&mut self) {
        self.languages.clear();
        self.references.clear();
        self.separating_functions.clear();
        self.adjacency_matrix = Some(AdjacencyMatrix::empty(Vec::new()));
    }
}
