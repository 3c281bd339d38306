//! Drives a [`TimelineView`] for one group and actor against the store and
//! the change feed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

use lookout_config::LookoutConfig;
use lookout_core::change::Change;
use lookout_core::entities::{AuditEntry, TimelineEvent};
use lookout_core::enums::EventType;
use lookout_core::errors::CoreError;
use lookout_db::repos::audit::AuditQuery;
use lookout_db::retry::{RetryConfig, with_retry};
use lookout_db::service::TimelineStore;
use lookout_feed::{ChangeFeed, FeedError, Subscription};

use crate::error::SyncError;
use crate::view::TimelineView;

/// Whether the client is receiving live notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Subscribed; the view follows every committed change.
    Live,
    /// No subscription; the view only changes on [`TimelineClient::refresh`].
    Degraded,
}

pub struct TimelineClient {
    store: Arc<TimelineStore>,
    feed: Option<ChangeFeed>,
    subscription: Option<Subscription>,
    view: TimelineView,
    actor_id: String,
    retry: RetryConfig,
    poll_interval: Duration,
}

impl TimelineClient {
    /// Subscribe to `group_id`, then seed the view from snapshots.
    ///
    /// Without a feed, or if subscribing fails, the client opens in
    /// [`SyncMode::Degraded`].
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the initial snapshot cannot be read.
    pub async fn open(
        store: Arc<TimelineStore>,
        feed: Option<ChangeFeed>,
        group_id: &str,
        actor_id: &str,
        config: &LookoutConfig,
    ) -> Result<Self, SyncError> {
        let limit = usize::try_from(config.general.audit_page_limit).unwrap_or(usize::MAX);
        let mut client = Self {
            store,
            feed,
            subscription: None,
            view: TimelineView::new(group_id, limit),
            actor_id: actor_id.to_string(),
            retry: RetryConfig::from(&config.retry),
            poll_interval: Duration::from_millis(config.feed.poll_interval_ms.max(1)),
        };
        client.subscribe();
        client.refresh().await?;
        tracing::debug!(group_id, mode = ?client.mode(), "timeline client opened");
        Ok(client)
    }

    fn subscribe(&mut self) {
        self.subscription = None;
        let group_id = self.view.group_id();
        let Some(feed) = &self.feed else {
            tracing::warn!(group_id, "no change feed, timeline is snapshot-only");
            return;
        };
        match feed.subscribe(group_id) {
            Ok(sub) => self.subscription = Some(sub),
            Err(e) => {
                tracing::warn!(group_id, error = %e, "subscribe failed, timeline is snapshot-only");
            }
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SyncMode {
        if self.subscription.is_some() {
            SyncMode::Live
        } else {
            SyncMode::Degraded
        }
    }

    #[must_use]
    pub const fn view(&self) -> &TimelineView {
        &self.view
    }

    #[must_use]
    pub fn group_id(&self) -> &str {
        self.view.group_id()
    }

    #[must_use]
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Add an event to this group's timeline.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the store rejects the event.
    pub async fn create(
        &mut self,
        event_type: EventType,
        label: &str,
        details: Option<&str>,
    ) -> Result<TimelineEvent, SyncError> {
        let store = self.store.as_ref();
        let (group_id, actor_id) = (self.view.group_id(), self.actor_id.as_str());
        let event = with_retry(&self.retry, "create_event", || {
            store.create_event(group_id, actor_id, event_type, label, details)
        })
        .await?;
        self.view.apply(&Change::event_inserted(event.clone()));
        Ok(event)
    }

    /// Edit an event's details optimistically.
    ///
    /// The new value is visible in [`Self::view`] before the write completes
    /// and is rolled back if the write fails. Blank details are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the event is unknown or locked, or the write
    /// fails after retries.
    pub async fn update_details(
        &mut self,
        event_id: &str,
        details: &str,
    ) -> Result<TimelineEvent, SyncError> {
        if details.trim().is_empty() {
            return self
                .view
                .get(event_id)
                .cloned()
                .ok_or_else(|| CoreError::event_not_found(event_id).into());
        }
        let edit = self.view.begin_edit(event_id, details)?;

        let store = self.store.as_ref();
        let actor_id = self.actor_id.as_str();
        let result = with_retry(&self.retry, "update_details", || {
            store.update_details(event_id, Some(actor_id), details)
        })
        .await;

        match result {
            Ok(event) => {
                self.view.confirm(edit, &event);
                Ok(event)
            }
            Err(e) => {
                tracing::warn!(event_id, error = %e, "edit failed, reverting");
                self.view.revert(edit);
                Err(e.into())
            }
        }
    }

    /// Undo the edit recorded by `entry`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the entry cannot be undone.
    pub async fn undo(&mut self, entry: &AuditEntry) -> Result<TimelineEvent, SyncError> {
        let store = self.store.as_ref();
        let actor_id = self.actor_id.as_str();
        let event = with_retry(&self.retry, "undo", || store.undo(Some(actor_id), entry)).await?;
        self.view.replace(&event);
        Ok(event)
    }

    /// Apply every notification already queued, without waiting.
    ///
    /// Falling behind triggers a full resync; a closed feed also drops the
    /// client to [`SyncMode::Degraded`].
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if a resync is needed and fails.
    pub async fn sync(&mut self) -> Result<usize, SyncError> {
        let mut applied = 0;
        loop {
            let Some(sub) = self.subscription.as_mut() else {
                return Ok(applied);
            };
            match sub.try_recv() {
                Ok(Some(change)) => {
                    self.view.apply(&change);
                    applied += 1;
                }
                Ok(None) => return Ok(applied),
                Err(e) => {
                    self.recover(&e).await?;
                    if self.subscription.is_none() {
                        return Ok(applied);
                    }
                }
            }
        }
    }

    /// Wait for one notification and apply it.
    ///
    /// Returns `None` when there was nothing to apply: the client is
    /// degraded, or it had to resync instead.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if a resync is needed and fails.
    pub async fn next_change(&mut self) -> Result<Option<Change>, SyncError> {
        let Some(sub) = self.subscription.as_mut() else {
            return Ok(None);
        };
        match sub.recv().await {
            Ok(change) => {
                self.view.apply(&change);
                Ok(Some(change))
            }
            Err(e) => {
                self.recover(&e).await?;
                Ok(None)
            }
        }
    }

    async fn recover(&mut self, error: &FeedError) -> Result<(), SyncError> {
        let group_id = self.view.group_id();
        match error {
            FeedError::Lagged(skipped) => {
                tracing::warn!(group_id, skipped, "missed notifications, resyncing");
            }
            FeedError::Closed | FeedError::Unavailable => {
                tracing::warn!(group_id, "change feed closed, timeline is snapshot-only");
                self.subscription = None;
            }
        }
        self.refresh().await
    }

    /// Reload events and recent activity from the store.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if either snapshot fails after retries.
    pub async fn refresh(&mut self) -> Result<(), SyncError> {
        let store = self.store.as_ref();
        let group_id = self.view.group_id();
        let events = with_retry(&self.retry, "list_by_group", || store.list_by_group(group_id)).await?;
        let query = AuditQuery::default();
        let page = with_retry(&self.retry, "list_audit", || store.list_audit(group_id, &query)).await?;
        tracing::debug!(group_id, events = events.len(), "timeline resynced");
        self.view.seed(events, page.entries);
        Ok(())
    }

    /// Follow the group until `shutdown` turns `true` or its sender is
    /// dropped. Live clients apply notifications as they arrive; degraded
    /// clients poll snapshots every `feed.poll_interval_ms`.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(group_id = %self.group_id(), mode = ?self.mode(), "timeline client running");

        while !*shutdown.borrow() {
            let live = self.subscription.is_some();
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                result = self.next_change(), if live => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "resync failed");
                    }
                }
                _ = poll.tick(), if !live => {
                    if let Err(e) = self.refresh().await {
                        tracing::warn!(error = %e, "poll failed");
                    }
                }
            }
        }
        tracing::info!(group_id = %self.group_id(), "timeline client stopped");
    }

    /// Drop the current subscription, subscribe again and resync.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the resync fails.
    pub async fn resubscribe(&mut self) -> Result<SyncMode, SyncError> {
        self.subscribe();
        self.refresh().await?;
        Ok(self.mode())
    }

    /// Unsubscribe now.
    pub fn close(mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.close();
        }
        tracing::debug!(group_id = %self.group_id(), "timeline client closed");
    }
}

impl std::fmt::Debug for TimelineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineClient")
            .field("group_id", &self.view.group_id())
            .field("actor_id", &self.actor_id)
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}
