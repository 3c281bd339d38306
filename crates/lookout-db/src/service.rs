//! Service layer coupling timeline mutations with their audit entries and
//! change notifications.
//!
//! `TimelineStore` wraps `LookoutDb` (raw database access) and an optional
//! `ChangeFeed`. All repo methods are implemented as `impl TimelineStore`.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lookout_config::{LookoutConfig, MAX_AUDIT_PAGE_LIMIT};
use lookout_core::change::Change;
use lookout_feed::ChangeFeed;

use crate::LookoutDb;
use crate::error::DatabaseError;
use crate::helpers::{format_timestamp, now_micros, parse_datetime};

/// Orchestrates timeline mutations with audit and notification.
///
/// Every mutation method follows this protocol:
/// 1. Take the write gate
/// 2. Begin transaction
/// 3. Execute SQL
/// 4. Append audit entry (inside transaction)
/// 5. Commit, or roll back on any failure
/// 6. Publish the committed changes, then release the gate
pub struct TimelineStore {
    db: LookoutDb,
    feed: Option<ChangeFeed>,
    gate: RwLock<()>,
    audit_page_limit: u32,
}

impl TimelineStore {
    /// Open a local database and wrap it.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `feed` - Where committed changes are published. `None` disables
    ///   notifications.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str, feed: Option<ChangeFeed>) -> Result<Self, DatabaseError> {
        let db = LookoutDb::open_local(db_path).await?;
        Ok(Self::from_db(db, feed))
    }

    /// Open the database named by `config` and apply its page limit.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open(config: &LookoutConfig, feed: Option<ChangeFeed>) -> Result<Self, DatabaseError> {
        if !config.database.is_in_memory() {
            if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
                create_parent(parent)?;
            }
        }
        Ok(Self::new_local(&config.database.path, feed)
            .await?
            .with_audit_page_limit(config.general.audit_page_limit))
    }

    /// [`Self::open`] with a change feed sized by `feed.capacity`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open_with_feed(config: &LookoutConfig) -> Result<Self, DatabaseError> {
        Self::open(config, Some(ChangeFeed::from(&config.feed))).await
    }

    /// Wrap an existing `LookoutDb`.
    #[must_use]
    pub fn from_db(db: LookoutDb, feed: Option<ChangeFeed>) -> Self {
        Self {
            db,
            feed,
            gate: RwLock::new(()),
            audit_page_limit: MAX_AUDIT_PAGE_LIMIT,
        }
    }

    /// Override the default audit page size (clamped to `1..=50`).
    #[must_use]
    pub fn with_audit_page_limit(mut self, limit: u32) -> Self {
        self.audit_page_limit = limit.clamp(1, MAX_AUDIT_PAGE_LIMIT);
        self
    }

    #[must_use]
    pub const fn db(&self) -> &LookoutDb {
        &self.db
    }

    #[must_use]
    pub const fn feed(&self) -> Option<&ChangeFeed> {
        self.feed.as_ref()
    }

    #[must_use]
    pub const fn audit_page_limit(&self) -> u32 {
        self.audit_page_limit
    }

    /// Exclusive access for one mutation transaction plus its publication.
    pub(crate) async fn write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().await
    }

    /// Shared access for snapshot reads.
    pub(crate) async fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().await
    }

    /// Publish committed changes in order. Call while holding the write gate.
    pub(crate) fn publish(&self, changes: impl IntoIterator<Item = Change>) {
        if let Some(feed) = &self.feed {
            for change in changes {
                feed.publish(change);
            }
        }
    }
}

fn create_parent(parent: &std::path::Path) -> Result<(), DatabaseError> {
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|e| {
        DatabaseError::InvalidState(format!("cannot create {}: {e}", parent.display()))
    })
}

/// Commit `tx` if `result` is `Ok`, otherwise roll it back and return the
/// original error.
pub(crate) async fn finish<T>(
    tx: libsql::Transaction,
    result: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}

/// The commit timestamp for the next audit entry in `group_id`: the current
/// time, bumped past the group's latest entry when the clock has not moved.
pub(crate) async fn next_commit_timestamp(
    conn: &libsql::Connection,
    group_id: &str,
) -> Result<DateTime<Utc>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT max(created_at) FROM timeline_event_audit WHERE group_id = ?1",
            [group_id],
        )
        .await?;
    let now = now_micros();
    let last = match rows.next().await? {
        Some(row) => row.get::<Option<String>>(0)?,
        None => None,
    };
    match last {
        Some(last) => {
            let floor = parse_datetime(&last)? + Duration::microseconds(1);
            let next = now.max(floor);
            if next != now {
                tracing::trace!(group_id, ts = %format_timestamp(&next), "commit timestamp bumped");
            }
            Ok(next)
        }
        None => Ok(now),
    }
}
