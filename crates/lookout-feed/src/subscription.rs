//! A live, ordered stream of one group's changes.

use std::sync::Weak;

use lookout_core::change::Change;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::{FeedError, FeedInner};

/// Receiving end of a group subscription.
///
/// Dropping it (or calling [`Subscription::close`]) unsubscribes immediately;
/// anything still buffered for it is discarded.
pub struct Subscription {
    group_id: String,
    rx: Option<broadcast::Receiver<Change>>,
    feed: Weak<FeedInner>,
}

impl Subscription {
    pub(crate) const fn new(
        group_id: String,
        rx: broadcast::Receiver<Change>,
        feed: Weak<FeedInner>,
    ) -> Self {
        Self {
            group_id,
            rx: Some(rx),
            feed,
        }
    }

    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Wait for the next change.
    ///
    /// # Errors
    ///
    /// [`FeedError::Lagged`] if changes were dropped since the last call (the
    /// stream stays usable), [`FeedError::Closed`] once the feed shut down.
    pub async fn recv(&mut self) -> Result<Change, FeedError> {
        let Some(rx) = self.rx.as_mut() else {
            return Err(FeedError::Closed);
        };
        match rx.recv().await {
            Ok(change) => Ok(change),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(group_id = %self.group_id, skipped, "feed: subscriber lagged");
                Err(FeedError::Lagged(skipped))
            }
            Err(RecvError::Closed) => Err(FeedError::Closed),
        }
    }

    /// Take the next change if one is already buffered.
    ///
    /// # Errors
    ///
    /// Same as [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Result<Option<Change>, FeedError> {
        let Some(rx) = self.rx.as_mut() else {
            return Err(FeedError::Closed);
        };
        match rx.try_recv() {
            Ok(change) => Ok(Some(change)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(group_id = %self.group_id, skipped, "feed: subscriber lagged");
                Err(FeedError::Lagged(skipped))
            }
            Err(TryRecvError::Closed) => Err(FeedError::Closed),
        }
    }

    /// Unsubscribe now.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release the receiver before checking the count.
        self.rx.take();
        if let Some(feed) = self.feed.upgrade() {
            feed.prune(&self.group_id);
        }
        tracing::debug!(group_id = %self.group_id, "feed: unsubscribed");
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("group_id", &self.group_id)
            .field("open", &self.rx.is_some())
            .finish_non_exhaustive()
    }
}
