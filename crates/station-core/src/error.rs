//! Error Taxonomy
//!
//! Per-action failures (validation, unknown references, reasoning
//! timeouts) are isolated and reported; only invariant violations may
//! abort a tick, and those are retried once from the pre-tick snapshot
//! before surfacing.

use thiserror::Error;

/// All errors surfaced by the simulation core.
#[derive(Debug, Clone, Error)]
pub enum SimError {
    /// Malformed memory or relationship values; rejected without partial
    /// application.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Reference to an agent that does not exist in the world.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// Reference to a room that is not part of the station map.
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    /// The reasoning backend did not answer within the configured budget.
    #[error("reasoning timed out for {agent} after {timeout_ms}ms")]
    ReasoningTimeout { agent: String, timeout_ms: u64 },

    /// The reasoning backend returned an error.
    #[error("reasoning failed for {agent}: {message}")]
    Reasoning { agent: String, message: String },

    /// World state failed its consistency check at commit time. Fatal for
    /// the tick if it survives the retry.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration could not be loaded or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl SimError {
    /// True for failures that abort a single action but never the tick.
    pub fn is_action_local(&self) -> bool {
        !matches!(self, SimError::InvariantViolation(_) | SimError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_local_classification() {
        assert!(SimError::UnknownAgent("x".into()).is_action_local());
        assert!(SimError::Validation("bad importance".into()).is_action_local());
        assert!(SimError::ReasoningTimeout {
            agent: "x".into(),
            timeout_ms: 2000
        }
        .is_action_local());
        assert!(!SimError::InvariantViolation("occupancy drift".into()).is_action_local());
    }

    #[test]
    fn test_display() {
        let err = SimError::UnknownRoom("Cafeteria".into());
        assert_eq!(err.to_string(), "unknown room: Cafeteria");
    }
}
