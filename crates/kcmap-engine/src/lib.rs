//! KC map inference engine
//!
//! Given a [`Graph`](kcmap_model::Graph) of asserted facts, derive every
//! fact they force and write it back with a structured proof:
//!
//! 1. **Upgrade**: a chain of polynomial (quasi-polynomial) edges forces a
//!    polynomial (quasi-polynomial) edge between its endpoints.
//! 2. **Downgrade**: an edge whose optimistic candidate makes the graph
//!    inconsistent gets the negation of that candidate, justified by
//!    refutation.
//! 3. **Operations**: lemmas, query composition along edges and their
//!    contrapositives refine the per-language operation facts.
//!
//! Derived facts only ever refine what was known; any collision with an
//! asserted fact aborts the call with a [`PropagationError`].
//!
//! ## Module Organization
//!
//! - `reachability`: BFS closure over allowed edge statuses (roaring rows)
//! - `validator`: the [`ConsistencyValidator`] seam and the built-in one
//! - `trial`: scoped speculative edits
//! - `upgrade`, `downgrade`, `operations`: the passes
//! - `describe`: derivation builders
//! - `propagate`: the orchestrator

pub mod describe;
pub mod downgrade;
pub mod error;
pub mod operations;
pub mod propagate;
pub mod reachability;
pub mod trial;
pub mod upgrade;
pub mod validator;

pub use error::PropagationError;
pub use propagate::{
    propagate, PropagationConfig, PropagationContext, PropagationSummary, Propagator,
};
pub use reachability::{Reachability, ReachabilityPair};
pub use validator::{ConsistencyValidator, ReachabilityValidator, ValidationReport, Violation};
