//! The propagation orchestrator.
//!
//! ```text
//!   prepare ─► precheck ─► ┌ upgrade* ─► downgrade* ─► operations* ┐ ─► final check
//!                          └─────────────── rounds ────────────────┘
//! ```
//!
//! `*` marks loops run to a fixed point. Each call builds its own
//! [`PropagationContext`]; nothing is cached between calls.

use crate::downgrade::downgrade_sweep;
use crate::error::PropagationError;
use crate::operations::propagate_operations;
use crate::reachability::ReachabilityPair;
use crate::upgrade::upgrade_sweep;
use crate::validator::{ConsistencyValidator, ReachabilityValidator, ValidationReport};
use kcmap_model::{Graph, LemmaTable, NameResolver};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Cap on sweeps in any single fixed-point loop.
    pub max_sweeps: usize,
    /// Cap on rounds. A round after the first runs only when the operation
    /// pass of the previous one changed something.
    pub max_rounds: usize,
    /// Run the operation-level pass.
    pub operations: bool,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_sweeps: 256,
            max_rounds: 8,
            operations: true,
        }
    }
}

/// Per-call state shared by the passes.
#[derive(Debug, Clone)]
pub struct PropagationContext {
    pub names: NameResolver,
    pub config: PropagationConfig,
}

impl PropagationContext {
    pub fn new(graph: &Graph, config: PropagationConfig) -> Self {
        Self {
            names: graph.names(),
            config,
        }
    }
}

/// What one call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationSummary {
    pub upgrades: usize,
    pub downgrades: usize,
    pub operation_changes: usize,
    pub rounds: usize,
}

impl PropagationSummary {
    pub fn total_changes(&self) -> usize {
        self.upgrades + self.downgrades + self.operation_changes
    }
}

pub struct Propagator<V> {
    validator: V,
    lemmas: LemmaTable,
    config: PropagationConfig,
}

impl Propagator<ReachabilityValidator> {
    /// The built-in validator over the standard operation catalog.
    pub fn standard() -> Self {
        let lemmas = LemmaTable::standard();
        Self::new(ReachabilityValidator::new(&lemmas), lemmas)
    }
}

impl<V: ConsistencyValidator> Propagator<V> {
    pub fn new(validator: V, lemmas: LemmaTable) -> Self {
        Self {
            validator,
            lemmas,
            config: PropagationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PropagationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Derive everything the asserted facts force and write it into `graph`.
    ///
    /// On error the graph may hold part of the derived facts; callers that
    /// persist it should discard it instead.
    pub fn run(&self, graph: &mut Graph) -> Result<PropagationSummary, PropagationError> {
        graph.prepare()?;
        let ctx = PropagationContext::new(graph, self.config.clone());
        let mut summary = PropagationSummary::default();

        self.check(graph, "input")?;
        info!(languages = graph.adjacency_matrix.len(), "precheck passed");

        // Downgrades keep every guaranteed tier, so they never reopen the
        // upgrade pass or the operation rules. Only new operation facts can
        // make the validator refute more edges, so only they start a round.
        loop {
            if summary.rounds == self.config.max_rounds {
                return Err(PropagationError::NoConvergence {
                    phase: "propagation rounds",
                    sweeps: summary.rounds,
                });
            }
            summary.rounds += 1;
            let upgrades = fixed_point("edge upgrade", self.config.max_sweeps, || {
                let reach = ReachabilityPair::compute(&graph.adjacency_matrix);
                upgrade_sweep(graph, &reach, &ctx)
            })?;
            let downgrades = fixed_point("edge downgrade", self.config.max_sweeps, || {
                downgrade_sweep(graph, &self.validator, &ctx)
            })?;
            info!(round = summary.rounds, upgrades, downgrades, "edge round finished");
            summary.upgrades += upgrades;
            summary.downgrades += downgrades;

            let edges_changed = upgrades + downgrades > 0;
            if !self.config.operations || (summary.rounds > 1 && !edges_changed) {
                break;
            }
            let changes = propagate_operations(graph, &self.lemmas, &ctx)?;
            info!(round = summary.rounds, changes, "operation pass finished");
            summary.operation_changes += changes;
            if changes == 0 {
                break;
            }
        }

        self.check(graph, "result")?;
        info!(
            upgrades = summary.upgrades,
            downgrades = summary.downgrades,
            operation_changes = summary.operation_changes,
            rounds = summary.rounds,
            "propagation finished"
        );
        Ok(summary)
    }

    /// Run the validator once and fail on any violation.
    pub fn check(&self, graph: &Graph, phase: &'static str) -> Result<(), PropagationError> {
        let report = self.report(graph, phase)?;
        match report.error() {
            None => Ok(()),
            Some(message) => Err(PropagationError::Inconsistent {
                phase,
                message: message.to_string(),
                violations: report.violations.len(),
            }),
        }
    }

    pub fn report(&self, graph: &Graph, phase: &str) -> Result<ValidationReport, PropagationError> {
        self.validator
            .validate(graph)
            .map_err(|source| PropagationError::Validator {
                context: format!("{phase} check"),
                source,
            })
    }
}

/// Propagate with the built-in validator, lemma table and configuration.
pub fn propagate(graph: &mut Graph) -> Result<PropagationSummary, PropagationError> {
    Propagator::standard().run(graph)
}

/// Repeat `sweep` until it reports no change; returns the total changes.
fn fixed_point(
    phase: &'static str,
    max_sweeps: usize,
    mut sweep: impl FnMut() -> Result<usize, PropagationError>,
) -> Result<usize, PropagationError> {
    let mut total = 0;
    for _ in 0..max_sweeps {
        let changed = sweep()?;
        if changed == 0 {
            return Ok(total);
        }
        total += changed;
    }
    Err(PropagationError::NoConvergence {
        phase,
        sweeps: max_sweeps,
    })
}
