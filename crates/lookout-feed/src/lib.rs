//! # lookout-feed
//!
//! Realtime fan-out of timeline and audit changes, scoped by group.
//!
//! Each group gets its own `tokio::sync::broadcast` channel, created lazily on
//! first subscription and pruned when the last subscriber goes away. Publishing
//! never blocks: changes for a group nobody is watching are dropped, and there
//! is no replay. A subscriber that falls more than `capacity` changes behind
//! sees [`FeedError::Lagged`] and must resynchronise from snapshot reads, as
//! must every new subscriber before trusting incremental changes.

mod error;
mod subscription;

pub use error::FeedError;
pub use subscription::Subscription;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use lookout_config::FeedConfig;
use lookout_core::change::Change;
use tokio::sync::broadcast;

/// Recommended: 256 for production, 16 for tests.
pub const DEFAULT_CAPACITY: usize = 256;

/// Handle to the change feed. Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct ChangeFeed {
    inner: Arc<FeedInner>,
}

pub(crate) struct FeedInner {
    capacity: usize,
    open: AtomicBool,
    groups: Mutex<HashMap<String, broadcast::Sender<Change>>>,
}

impl FeedInner {
    pub(crate) fn groups(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<Change>>> {
        // A panic while holding this lock cannot leave the map half-updated.
        self.groups
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Drop the group's channel if nobody is listening any more.
    pub(crate) fn prune(&self, group_id: &str) {
        let mut groups = self.groups();
        if groups
            .get(group_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            groups.remove(group_id);
            tracing::debug!(group_id, "feed: pruned idle group channel");
        }
    }
}

impl ChangeFeed {
    /// Create a feed whose per-group buffers hold `capacity` changes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                capacity: capacity.max(1),
                open: AtomicBool::new(true),
                groups: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Per-group buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Start observing a group.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Unavailable`] once the feed has been shut down.
    pub fn subscribe(&self, group_id: &str) -> Result<Subscription, FeedError> {
        if !self.is_open() {
            tracing::warn!(group_id, "feed: subscribe refused, feed is shut down");
            return Err(FeedError::Unavailable);
        }
        let rx = {
            let mut groups = self.inner.groups();
            groups
                .entry(group_id.to_string())
                .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
                .subscribe()
        };
        tracing::debug!(group_id, "feed: subscribed");
        Ok(Subscription::new(
            group_id.to_string(),
            rx,
            Arc::downgrade(&self.inner),
        ))
    }

    /// Fan a change out to the group's current subscribers.
    ///
    /// Returns how many subscribers it was delivered to. Never blocks.
    pub fn publish(&self, change: Change) -> usize {
        if !self.is_open() {
            return 0;
        }
        let group_id = change.group_id.clone();
        let source = change.source();
        let op = change.op();
        let mut groups = self.inner.groups();
        let Some(tx) = groups.get(&group_id) else {
            tracing::debug!(group_id, %source, %op, "feed: no subscribers, change dropped");
            return 0;
        };
        if let Ok(delivered) = tx.send(change) {
            tracing::debug!(group_id, %source, %op, delivered, "feed: published");
            delivered
        } else {
            groups.remove(&group_id);
            0
        }
    }

    /// Stop the feed. Existing subscribers drain what is buffered and then see
    /// [`FeedError::Closed`]; new subscriptions fail with
    /// [`FeedError::Unavailable`].
    pub fn shutdown(&self) {
        self.inner.open.store(false, Ordering::SeqCst);
        self.inner.groups().clear();
        tracing::info!("feed: shut down");
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions for a group.
    #[must_use]
    pub fn subscriber_count(&self, group_id: &str) -> usize {
        self.inner
            .groups()
            .get(group_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of groups with at least one channel allocated.
    #[must_use]
    pub fn active_groups(&self) -> usize {
        self.inner.groups().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl From<&FeedConfig> for ChangeFeed {
    fn from(config: &FeedConfig) -> Self {
        Self::new(config.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lookout_core::entities::TimelineEvent;
    use lookout_core::enums::{EventType, MutationKind};
    use pretty_assertions::assert_eq;

    fn event(group: &str, id: &str) -> TimelineEvent {
        TimelineEvent {
            id: id.to_string(),
            group_id: group.to_string(),
            actor_id: "u1".to_string(),
            event_type: EventType::Custom,
            label: "Custom".to_string(),
            details: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let feed = ChangeFeed::new(16);
        let mut sub = feed.subscribe("g1").unwrap();

        for i in 0..3 {
            feed.publish(Change::event_inserted(event("g1", &format!("evt-{i:08x}"))));
        }

        for i in 0..3 {
            let change = sub.recv().await.unwrap();
            assert_eq!(change.event_id(), Some(format!("evt-{i:08x}").as_str()));
            assert_eq!(change.op(), MutationKind::Insert);
        }
    }

    #[tokio::test]
    async fn scoped_by_group() {
        let feed = ChangeFeed::new(16);
        let mut g1 = feed.subscribe("g1").unwrap();
        let mut g2 = feed.subscribe("g2").unwrap();

        feed.publish(Change::event_inserted(event("g2", "evt-00000001")));

        assert!(g1.try_recv().unwrap().is_none());
        let change = g2.try_recv().unwrap().expect("g2 should see its change");
        assert_eq!(change.group_id, "g2");
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let feed = ChangeFeed::new(16);
        assert_eq!(
            feed.publish(Change::event_inserted(event("g1", "evt-00000001"))),
            0
        );
        assert_eq!(feed.active_groups(), 0);
    }

    #[test]
    fn no_replay_after_resubscribe() {
        let feed = ChangeFeed::new(16);
        let sub = feed.subscribe("g1").unwrap();
        sub.close();

        feed.publish(Change::event_inserted(event("g1", "evt-00000001")));

        let mut again = feed.subscribe("g1").unwrap();
        assert!(again.try_recv().unwrap().is_none());
    }

    #[test]
    fn dropping_last_subscription_prunes_group() {
        let feed = ChangeFeed::new(16);
        let a = feed.subscribe("g1").unwrap();
        let b = feed.subscribe("g1").unwrap();
        assert_eq!(feed.subscriber_count("g1"), 2);

        drop(a);
        assert_eq!(feed.subscriber_count("g1"), 1);
        assert_eq!(feed.active_groups(), 1);

        b.close();
        assert_eq!(feed.subscriber_count("g1"), 0);
        assert_eq!(feed.active_groups(), 0);
    }

    #[test]
    fn lagging_subscriber_is_told() {
        let feed = ChangeFeed::new(2);
        let mut sub = feed.subscribe("g1").unwrap();
        for i in 0..5 {
            feed.publish(Change::event_inserted(event("g1", &format!("evt-{i:08x}"))));
        }
        assert!(matches!(sub.try_recv(), Err(FeedError::Lagged(3))));
        // after the lag report the newest changes are still readable
        assert!(sub.try_recv().unwrap().is_some());
    }

    #[test]
    fn capacity_comes_from_config() {
        let config = FeedConfig {
            capacity: 3,
            ..FeedConfig::default()
        };
        let feed = ChangeFeed::from(&config);
        assert_eq!(feed.capacity(), 3);

        let mut sub = feed.subscribe("g1").unwrap();
        for i in 0..4 {
            feed.publish(Change::event_inserted(event("g1", &format!("evt-{i:08x}"))));
        }
        assert!(matches!(sub.try_recv(), Err(FeedError::Lagged(1))));
    }

    #[tokio::test]
    async fn shutdown_closes_and_refuses() {
        let feed = ChangeFeed::new(16);
        let mut sub = feed.subscribe("g1").unwrap();
        feed.publish(Change::event_inserted(event("g1", "evt-00000001")));
        feed.shutdown();

        // buffered change is still drained first
        assert!(sub.recv().await.is_ok());
        assert!(matches!(sub.recv().await, Err(FeedError::Closed)));
        assert!(matches!(feed.subscribe("g1"), Err(FeedError::Unavailable)));
        assert_eq!(
            feed.publish(Change::event_inserted(event("g1", "evt-00000002"))),
            0
        );
    }
}
