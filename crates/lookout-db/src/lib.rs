//! # lookout-db
//!
//! libSQL storage for the group timeline: the event store, its append-only
//! audit log, and undo.
//!
//! Every mutation runs in one libSQL transaction that couples the row change
//! with exactly one audit entry, then publishes the committed changes to the
//! injected [`lookout_feed::ChangeFeed`].

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod retry;
pub mod service;
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Raw database handle: one libSQL database and its connection.
pub struct LookoutDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl LookoutDb {
    /// Open a local database at `path` (`":memory:"` for tests).
    ///
    /// Runs migrations on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let lookout_db = Self { db, conn };
        lookout_db.run_migrations().await?;
        tracing::info!(path, "timeline database opened");
        Ok(lookout_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL, e.g. `"evt-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        generate_id(&self.conn, prefix).await
    }
}

/// `randomblob(4)` gives 8 hex chars after the prefix.
pub(crate) async fn generate_id(
    conn: &libsql::Connection,
    prefix: &str,
) -> Result<String, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
            (),
        )
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<String>(0)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> LookoutDb {
        LookoutDb::open_local(":memory:").await.unwrap()
    }

    async fn object_exists(db: &LookoutDb, kind: &str, name: &str) -> bool {
        let mut rows = db
            .conn()
            .query(
                "SELECT name FROM sqlite_master WHERE type = ?1 AND name = ?2",
                [kind, name],
            )
            .await
            .unwrap();
        rows.next().await.unwrap().is_some()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;
        for table in ["timeline_events", "timeline_event_audit"] {
            assert!(object_exists(&db, "table", table).await, "table '{table}' should exist");
        }
        for trigger in [
            "timeline_event_audit_no_update",
            "timeline_event_audit_no_delete",
        ] {
            assert!(
                object_exists(&db, "trigger", trigger).await,
                "trigger '{trigger}' should exist"
            );
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
        assert!(object_exists(&db, "index", "idx_timeline_events_group_created").await);
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("evt").await.unwrap();
        assert!(id.starts_with("evt-"), "ID should start with 'evt-': {id}");
        assert_eq!(id.len(), 12, "3 prefix + 1 dash + 8 hex: {id}");
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_unique() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            assert!(ids.insert(db.generate_id("aud").await.unwrap()));
        }
    }
}
