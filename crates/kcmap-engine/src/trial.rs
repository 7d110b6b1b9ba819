//! Scoped speculative edits.

use kcmap_model::{DirectedRelation, Graph, Status};

/// Replaces one matrix entry with a bare candidate for as long as it lives.
///
/// The original entry is put back when the guard drops, so the graph is
/// restored on every exit path including early returns and unwinding.
pub struct Trial<'g> {
    graph: &'g mut Graph,
    i: usize,
    j: usize,
    original: Option<Option<DirectedRelation>>,
}

impl<'g> Trial<'g> {
    pub fn begin(graph: &'g mut Graph, i: usize, j: usize, candidate: Status) -> Self {
        let original = graph.adjacency_matrix.take(i, j);
        graph
            .adjacency_matrix
            .set(i, j, Some(DirectedRelation::asserted(candidate)));
        Self {
            graph,
            i,
            j,
            original: Some(original),
        }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            self.graph.adjacency_matrix.set(self.i, self.j, original);
        }
    }
}
