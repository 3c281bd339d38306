//! Reconciler error types.

use lookout_core::errors::CoreError;
use lookout_db::error::DatabaseError;
use lookout_feed::FeedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl SyncError {
    /// The domain error behind this failure, whether raised locally or by
    /// the store.
    #[must_use]
    pub const fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            Self::Database(e) => e.as_core(),
            Self::Feed(_) => None,
        }
    }

    #[must_use]
    pub const fn is_policy(&self) -> bool {
        matches!(self.as_core(), Some(CoreError::Policy(_)))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.as_core(), Some(CoreError::NotFound { .. }))
    }
}
