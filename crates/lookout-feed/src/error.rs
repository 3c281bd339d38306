//! Feed error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The feed is shut down; fall back to snapshot reads.
    #[error("Change feed unavailable")]
    Unavailable,

    /// The subscriber fell behind and this many changes were dropped.
    #[error("Subscriber lagged: {0} changes dropped")]
    Lagged(u64),

    /// The feed was shut down while subscribed.
    #[error("Change feed closed")]
    Closed,
}
