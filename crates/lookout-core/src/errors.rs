//! Cross-cutting error types for Lookout.
//!
//! This module defines the domain failures every layer can report. Storage
//! and transport errors are defined in their own crates (`DatabaseError`,
//! `FeedError`) and wrap `CoreError` where a domain failure passes through.

use thiserror::Error;

/// Domain errors raised by timeline operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input: blank label, unknown event type.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// The mutability policy or undo rules forbid the operation.
    #[error("Policy violation: {0}")]
    Policy(String),

    /// The operation lacks the data it needs (e.g. undo without a prior value).
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for a missing timeline event.
    pub fn event_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "timeline_event".to_string(),
            id: id.into(),
        }
    }

    /// Shorthand for a missing audit entry.
    pub fn audit_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "audit_entry".to_string(),
            id: id.into(),
        }
    }
}
