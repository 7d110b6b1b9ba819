//! Transitive reachability over a chosen class of edge statuses.
//!
//! For every source we run a breadth-first traversal that only follows
//! edges whose status is in the allowed set, and remember the predecessor
//! through which each target was first reached. Any path is an acceptable
//! witness; BFS just happens to keep them short.

use kcmap_model::{AdjacencyMatrix, Status};
use roaring::RoaringBitmap;
use std::collections::VecDeque;

/// Edges that guarantee a polynomial transformation.
pub const POLY_EDGES: &[Status] = &[Status::Poly];

/// Edges that guarantee a quasi-polynomial transformation.
pub const QUASI_EDGES: &[Status] = &[Status::Poly, Status::UnknownPolyQuasi, Status::NoPolyQuasi];

#[derive(Debug, Clone)]
pub struct Reachability {
    /// `reach[i]` holds every `j != i` reachable from `i`.
    reach: Vec<RoaringBitmap>,
    /// `parent[i][j]`: predecessor of `j` on the recorded path from `i`.
    parent: Vec<Vec<Option<usize>>>,
}

impl Reachability {
    pub fn compute(matrix: &AdjacencyMatrix, allowed: &[Status]) -> Self {
        let n = matrix.len();
        let mut reach = vec![RoaringBitmap::new(); n];
        let mut parent = vec![vec![None; n]; n];

        for source in 0..n {
            let mut visited = RoaringBitmap::new();
            visited.insert(source as u32);
            let mut queue = VecDeque::from([source]);

            while let Some(u) = queue.pop_front() {
                for v in 0..n {
                    if v == u || visited.contains(v as u32) {
                        continue;
                    }
                    let Some(status) = matrix.status(u, v) else {
                        continue;
                    };
                    if !allowed.contains(&status) {
                        continue;
                    }
                    visited.insert(v as u32);
                    reach[source].insert(v as u32);
                    parent[source][v] = Some(u);
                    queue.push_back(v);
                }
            }
        }

        Self { reach, parent }
    }

    pub fn len(&self) -> usize {
        self.reach.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reach.is_empty()
    }

    pub fn reaches(&self, i: usize, j: usize) -> bool {
        self.reach[i].contains(j as u32)
    }

    pub fn parent(&self, i: usize, j: usize) -> Option<usize> {
        self.parent[i][j]
    }

    /// Walk the recorded predecessors from `j` back to `i`.
    ///
    /// Returns `[i, ..., j]`, or `None` when `j` is not reachable from `i`.
    pub fn path(&self, i: usize, j: usize) -> Option<Vec<usize>> {
        if !self.reaches(i, j) {
            return None;
        }
        let mut path = vec![j];
        let mut current = j;
        // A predecessor chain never revisits a node, so it ends within n hops.
        for _ in 0..self.len() {
            let prev = self.parent[i][current]?;
            path.push(prev);
            if prev == i {
                path.reverse();
                return Some(path);
            }
            current = prev;
        }
        None
    }

    /// Like [`Reachability::path`], falling back to the direct pair `[i, j]`.
    pub fn ensure_path(&self, i: usize, j: usize) -> Vec<usize> {
        self.path(i, j).unwrap_or_else(|| vec![i, j])
    }

    /// `true` when every pair reachable here is reachable in `other`.
    pub fn is_subset_of(&self, other: &Reachability) -> bool {
        self.reach.len() == other.reach.len()
            && self
                .reach
                .iter()
                .zip(&other.reach)
                .all(|(mine, theirs)| mine.is_subset(theirs))
    }
}

/// The two reachability relations every pass works from.
#[derive(Debug, Clone)]
pub struct ReachabilityPair {
    pub poly: Reachability,
    pub quasi: Reachability,
}

impl ReachabilityPair {
    pub fn compute(matrix: &AdjacencyMatrix) -> Self {
        Self {
            poly: Reachability::compute(matrix, POLY_EDGES),
            quasi: Reachability::compute(matrix, QUASI_EDGES),
        }
    }
}
