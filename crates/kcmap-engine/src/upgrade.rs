//! Positive closure: whatever a chain of guaranteed edges forces.

use crate::describe::{self, Half};
use crate::error::PropagationError;
use crate::propagate::PropagationContext;
use crate::reachability::ReachabilityPair;
use crate::validator::edge_step;
use kcmap_model::relation::merge_proof;
use kcmap_model::status::effective;
use kcmap_model::{render, DirectedRelation, Graph, Knowledge, Proof, Status, Tier};
use tracing::debug;

/// One row-major sweep over every ordered pair.
///
/// `reach` must describe the graph as it was when the sweep started; pairs
/// upgraded during the sweep only become visible to the next one. Returns
/// the number of pairs changed.
pub fn upgrade_sweep(
    graph: &mut Graph,
    reach: &ReachabilityPair,
    ctx: &PropagationContext,
) -> Result<usize, PropagationError> {
    let matrix = &mut graph.adjacency_matrix;
    let pairs: Vec<(usize, usize)> = matrix.pairs().collect();
    let mut changed = 0;

    for (i, j) in pairs {
        let before = matrix.status(i, j);
        let current = effective(before);
        let poly_forced = reach.poly.reaches(i, j);
        let quasi_forced = reach.quasi.reaches(i, j);

        let tier = if poly_forced && !current.guarantees(Tier::Poly) {
            Tier::Poly
        } else if quasi_forced && !current.guarantees(Tier::Quasi) {
            Tier::Quasi
        } else {
            continue;
        };
        let witness = match tier {
            Tier::Poly => &reach.poly,
            Tier::Quasi => &reach.quasi,
        };
        let path = witness.ensure_path(i, j);
        let forced_status = match tier {
            Tier::Poly => Status::Poly,
            Tier::Quasi => Status::UnknownPolyQuasi,
        };
        let fresh = describe::transitive(matrix, &path, forced_status);

        let after = match current.refine(Knowledge::holds(tier)) {
            Ok(after) => after,
            Err(_) => {
                let conflict = edge_step(matrix, i, j);
                return Err(PropagationError::StructuralContradiction {
                    from: matrix.id(i).to_string(),
                    to: matrix.id(j).to_string(),
                    message: format!(
                        "{} This contradicts {}.",
                        render::derivation(&fresh, &ctx.names),
                        render::step(&conflict, &ctx.names)
                    ),
                });
            }
        };

        let proof = match Half::kept_by(current) {
            Some(half) => {
                let existing =
                    describe::existing_edge(matrix.id(i), matrix.id(j), matrix.get(i, j), half);
                merge_proof(current, existing, after, fresh)
            }
            None => Proof::Single(fresh),
        };

        debug!(
            from = matrix.id(i),
            to = matrix.id(j),
            before = %current,
            after = %after,
            hops = path.len() - 1,
            "upgraded relation"
        );
        match matrix.get_mut(i, j) {
            Some(rel) => rel.set_derived(after, proof),
            None => matrix.set(i, j, Some(DirectedRelation::derived(after, proof))),
        }
        changed += 1;
    }

    Ok(changed)
}
