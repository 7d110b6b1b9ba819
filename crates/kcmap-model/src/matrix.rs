//! Square adjacency matrix of nullable relations, addressed by language id.

use crate::relation::DirectedRelation;
use crate::status::Status;
use crate::ModelError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacencyMatrix {
    language_ids: Vec<String>,
    matrix: Vec<Vec<Option<DirectedRelation>>>,
    /// Derived from `language_ids`; see [`AdjacencyMatrix::rebuild_index`].
    #[serde(skip)]
    index: AHashMap<String, usize>,
}

impl AdjacencyMatrix {
    /// An all-null matrix sized to `language_ids`.
    pub fn empty(language_ids: Vec<String>) -> Self {
        let n = language_ids.len();
        let index = language_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self {
            language_ids,
            matrix: vec![vec![None; n]; n],
            index,
        }
    }

    /// Recompute the id → index map from the id list and check the shape.
    ///
    /// Deserialized matrices come without an index, and callers may have
    /// edited the id list, so this runs at the start of every propagation.
    pub fn rebuild_index(&mut self) -> Result<(), ModelError> {
        let n = self.language_ids.len();
        if self.matrix.len() != n {
            return Err(ModelError::Shape {
                languages: n,
                rows: self.matrix.len(),
                row: None,
            });
        }
        for (i, row) in self.matrix.iter().enumerate() {
            if row.len() != n {
                return Err(ModelError::Shape {
                    languages: n,
                    rows: row.len(),
                    row: Some(i),
                });
            }
        }
        let mut index = AHashMap::with_capacity(n);
        for (i, id) in self.language_ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(ModelError::DuplicateLanguage(id.clone()));
            }
        }
        self.index = index;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.language_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.language_ids.is_empty()
    }

    pub fn language_ids(&self) -> &[String] {
        &self.language_ids
    }

    pub fn id(&self, i: usize) -> &str {
        &self.language_ids[i]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn require_index(&self, id: &str) -> Result<usize, ModelError> {
        self.index_of(id)
            .ok_or_else(|| ModelError::UnknownLanguage(id.to_string()))
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&DirectedRelation> {
        self.matrix[i][j].as_ref()
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut DirectedRelation> {
        self.matrix[i][j].as_mut()
    }

    /// Status on `i → j`, `None` when unresolved and never asserted.
    pub fn status(&self, i: usize, j: usize) -> Option<Status> {
        self.get(i, j).map(|rel| rel.status)
    }

    pub fn set(&mut self, i: usize, j: usize, relation: Option<DirectedRelation>) {
        self.matrix[i][j] = relation;
    }

    /// Remove and return the relation on `i → j`.
    pub fn take(&mut self, i: usize, j: usize) -> Option<DirectedRelation> {
        self.matrix[i][j].take()
    }

    pub fn get_by_id(&self, from: &str, to: &str) -> Result<Option<&DirectedRelation>, ModelError> {
        let i = self.require_index(from)?;
        let j = self.require_index(to)?;
        Ok(self.get(i, j))
    }

    pub fn set_by_id(
        &mut self,
        from: &str,
        to: &str,
        relation: Option<DirectedRelation>,
    ) -> Result<(), ModelError> {
        let i = self.require_index(from)?;
        let j = self.require_index(to)?;
        if i == j {
            return Err(ModelError::Diagonal(from.to_string()));
        }
        self.set(i, j, relation);
        Ok(())
    }

    /// Every ordered pair `(i, j)` with `i != j`, row-major.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> {
        let n = self.len();
        (0..n).flat_map(move |i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
    }
}
