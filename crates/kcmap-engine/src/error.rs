use kcmap_model::ModelError;

/// Every failure is fatal for the whole call: the caller must reject the
/// batch of asserted facts that produced it.
#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    #[error("malformed graph: {0}")]
    MalformedGraph(#[from] ModelError),

    /// The Phase-0 or final consistency check found violations.
    #[error("{phase} consistency check failed ({violations} violation(s)): {message}")]
    Inconsistent {
        phase: &'static str,
        message: String,
        violations: usize,
    },

    /// A transitively forced fact collides with an explicit negative one.
    #[error("structural contradiction on {from} → {to}: {message}")]
    StructuralContradiction {
        from: String,
        to: String,
        message: String,
    },

    /// A speculative trial was rejected for a reason the trial edge plays no part in.
    #[error("validation failure while testing {from} → {to}: {message}")]
    ValidationFailure {
        from: String,
        to: String,
        message: String,
    },

    #[error("consistency validator failed during {context}")]
    Validator {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("operation contradiction for {operation} on {language}: {message}")]
    OperationContradiction {
        language: String,
        operation: String,
        message: String,
    },

    /// `sweeps` counts sweeps of a fixed-point loop, or rounds for `"propagation rounds"`.
    #[error("{phase} did not reach a fixed point within {sweeps} iterations")]
    NoConvergence { phase: &'static str, sweeps: usize },
}
