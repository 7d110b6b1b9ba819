//! Negative inference by refutation.
//!
//! For an edge whose status is not fully known we tentatively assert the
//! most optimistic remaining candidate, run the whole-graph validator, and
//! restore the edge. If the candidate produces a contradiction that goes
//! through the edge, its negation is derived:
//!
//! | current                 | candidate            | refuted ⇒                |
//! |-------------------------|----------------------|--------------------------|
//! | absent / unknown-both   | poly                 | try unknown-poly-quasi   |
//! |                         | unknown-poly-quasi   | no-quasi                 |
//! |                         | (passes)             | no-poly-unknown-quasi    |
//! | unknown-poly-quasi      | poly                 | no-poly-quasi            |
//! | no-poly-unknown-quasi   | no-poly-quasi        | no-quasi                 |

use crate::describe::{self, Half};
use crate::error::PropagationError;
use crate::propagate::PropagationContext;
use crate::trial::Trial;
use crate::validator::{ConsistencyValidator, Violation};
use kcmap_model::relation::merge_proof;
use kcmap_model::status::effective;
use kcmap_model::{Claim, Derivation, DirectedRelation, Graph, Proof, Status};
use tracing::debug;

/// One row-major sweep of [`try_downgrade`] over every ordered pair.
pub fn downgrade_sweep<V: ConsistencyValidator + ?Sized>(
    graph: &mut Graph,
    validator: &V,
    ctx: &PropagationContext,
) -> Result<usize, PropagationError> {
    let pairs: Vec<(usize, usize)> = graph.adjacency_matrix.pairs().collect();
    let mut changed = 0;
    for (i, j) in pairs {
        if try_downgrade(graph, i, j, validator, ctx)? {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Attempt the next downgrade for `i → j`. Returns `true` when the edge changed.
pub fn try_downgrade<V: ConsistencyValidator + ?Sized>(
    graph: &mut Graph,
    i: usize,
    j: usize,
    validator: &V,
    ctx: &PropagationContext,
) -> Result<bool, PropagationError> {
    let current = effective(graph.adjacency_matrix.status(i, j));

    let (after, fresh) = match current {
        Status::UnknownBoth => {
            let Some(no_poly) = refute(graph, i, j, Status::Poly, Status::NoPolyUnknownQuasi, validator)?
            else {
                return Ok(false);
            };
            match refute(graph, i, j, Status::UnknownPolyQuasi, Status::NoQuasi, validator)? {
                Some(no_quasi) => (Status::NoQuasi, no_quasi),
                None => (Status::NoPolyUnknownQuasi, no_poly),
            }
        }
        Status::UnknownPolyQuasi => {
            match refute(graph, i, j, Status::Poly, Status::NoPolyQuasi, validator)? {
                Some(d) => (Status::NoPolyQuasi, d),
                None => return Ok(false),
            }
        }
        Status::NoPolyUnknownQuasi => {
            match refute(graph, i, j, Status::NoPolyQuasi, Status::NoQuasi, validator)? {
                Some(d) => (Status::NoQuasi, d),
                None => return Ok(false),
            }
        }
        Status::Poly | Status::NoPolyQuasi | Status::NoQuasi => return Ok(false),
    };

    let matrix = &mut graph.adjacency_matrix;
    let proof = match Half::kept_by(current) {
        Some(half) => {
            let existing = describe::existing_edge(matrix.id(i), matrix.id(j), matrix.get(i, j), half);
            merge_proof(current, existing, after, fresh)
        }
        None => Proof::Single(fresh),
    };
    debug!(
        from = ctx.names.name(matrix.id(i)),
        to = ctx.names.name(matrix.id(j)),
        before = %current,
        after = %after,
        "downgraded relation"
    );
    match matrix.get_mut(i, j) {
        Some(rel) => rel.set_derived(after, proof),
        None => matrix.set(i, j, Some(DirectedRelation::derived(after, proof))),
    }
    Ok(true)
}

/// Try `candidate` on `i → j`; when the validator refutes it, derive `conclusion`.
fn refute<V: ConsistencyValidator + ?Sized>(
    graph: &mut Graph,
    i: usize,
    j: usize,
    candidate: Status,
    conclusion: Status,
    validator: &V,
) -> Result<Option<Derivation>, PropagationError> {
    let from = graph.adjacency_matrix.id(i).to_string();
    let to = graph.adjacency_matrix.id(j).to_string();

    let trial = Trial::begin(graph, i, j, candidate);
    let outcome = validator.validate(trial.graph());
    drop(trial);
    let report = outcome.map_err(|source| PropagationError::Validator {
        context: format!("trial of {from} → {to} as {candidate}"),
        source,
    })?;

    if report.ok() {
        return Ok(None);
    }
    let relevant: Vec<Violation> = report
        .violations
        .into_iter()
        .filter(|v| v.involves_edge(&from, &to))
        .collect();
    if relevant.is_empty() {
        return Err(PropagationError::ValidationFailure {
            from,
            to,
            message: format!(
                "the graph became inconsistent for a reason unrelated to this edge while trying {candidate}"
            ),
        });
    }

    Ok(Some(describe::refutation(
        Claim::edge(from.as_str(), to.as_str(), candidate),
        Claim::edge(from.as_str(), to.as_str(), conclusion),
        &relevant,
    )))
}
