//! The unit handed to the engine: languages plus their adjacency matrix.

use crate::language::{Language, NameResolver};
use crate::matrix::AdjacencyMatrix;
use crate::relation::{DirectedRelation, OperationFact};
use crate::ModelError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub languages: Vec<Language>,
    pub adjacency_matrix: AdjacencyMatrix,
}

impl Graph {
    /// A graph over `languages` with no relations.
    pub fn new(languages: Vec<Language>) -> Self {
        let ids = languages.iter().map(|l| l.id.clone()).collect();
        Self {
            languages,
            adjacency_matrix: AdjacencyMatrix::empty(ids),
        }
    }

    /// Replace the matrix by an all-null one sized to the current languages.
    pub fn clear_relations(&mut self) {
        let ids = self.languages.iter().map(|l| l.id.clone()).collect();
        self.adjacency_matrix = AdjacencyMatrix::empty(ids);
    }

    /// Check the matrix shape and rebuild its index.
    pub fn prepare(&mut self) -> Result<(), ModelError> {
        self.adjacency_matrix.rebuild_index()
    }

    pub fn names(&self) -> NameResolver {
        NameResolver::from_languages(&self.languages)
    }

    pub fn language(&self, id: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.id == id)
    }

    pub fn language_position(&self, id: &str) -> Option<usize> {
        self.languages.iter().position(|l| l.id == id)
    }

    pub fn relation(&self, from: &str, to: &str) -> Result<Option<&DirectedRelation>, ModelError> {
        self.adjacency_matrix.get_by_id(from, to)
    }

    /// Assert (or clear) a relation by language ids.
    pub fn assert_relation(
        &mut self,
        from: &str,
        to: &str,
        relation: Option<DirectedRelation>,
    ) -> Result<(), ModelError> {
        self.adjacency_matrix.set_by_id(from, to, relation)
    }

    pub fn operation(&self, language: &str, op: &str) -> Option<&OperationFact> {
        self.language(language)?.operations.get(op)
    }

    pub fn assert_operation(
        &mut self,
        language: &str,
        op: &str,
        fact: OperationFact,
    ) -> Result<(), ModelError> {
        let pos = self
            .language_position(language)
            .ok_or_else(|| ModelError::UnknownLanguage(language.to_string()))?;
        self.languages[pos].operations.insert(op.to_string(), fact);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[test]
    fn clear_relations_resizes_to_languages() {
        let mut g = Graph::new(vec![Language::new("a", "A"), Language::new("b", "B")]);
        g.assert_relation("a", "b", Some(DirectedRelation::asserted(Status::Poly)))
            .unwrap();
        g.languages.push(Language::new("c", "C"));
        g.clear_relations();
        g.prepare().unwrap();
        assert_eq!(g.adjacency_matrix.len(), 3);
        assert!(g.relation("a", "b").unwrap().is_none());
    }

    #[test]
    fn graph_json_uses_adjacency_matrix_key() {
        let g = Graph::new(vec![Language::new("a", "A")]);
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["adjacencyMatrix"]["languageIds"][0], "a");
        assert_eq!(json["adjacencyMatrix"]["matrix"][0][0], serde_json::Value::Null);
    }
}
