//! Database error types for lookout-db.

use lookout_core::errors::CoreError;
use thiserror::Error;

use crate::retry::is_transient_libsql_error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A domain rule rejected the operation (validation, not found, policy,
    /// precondition).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether the storage layer itself was unreachable or busy. Only these
    /// failures are worth retrying; every other error would fail identically.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::LibSql(e) => is_transient_libsql_error(e),
            _ => false,
        }
    }

    /// The domain error, if this is one.
    #[must_use]
    pub const fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(CoreError::NotFound { .. }))
    }

    #[must_use]
    pub const fn is_policy(&self) -> bool {
        matches!(self, Self::Core(CoreError::Policy(_)))
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Core(CoreError::Validation(_)))
    }

    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Core(CoreError::Precondition(_)))
    }
}
