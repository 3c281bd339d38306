//! Audit log repository.
//!
//! Entries are appended only from inside a store mutation transaction and are
//! read back newest first, one page at a time.

use chrono::{DateTime, Utc};

use lookout_config::MAX_AUDIT_PAGE_LIMIT;
use lookout_core::entities::AuditEntry;
use lookout_core::errors::CoreError;

use crate::error::DatabaseError;
use crate::helpers::{AUDIT_COLUMNS, format_timestamp, row_to_audit, snapshot_json};
use crate::service::TimelineStore;

/// Paging criteria for [`TimelineStore::list_audit`].
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Page size; defaults to the store's page limit and is capped at 50.
    pub limit: Option<u32>,
    /// Only entries strictly older than this.
    pub before: Option<DateTime<Utc>>,
}

impl AuditQuery {
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn before(mut self, cursor: DateTime<Utc>) -> Self {
        self.before = Some(cursor);
        self
    }
}

/// One page of audit entries, most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    /// Pass as `before` to fetch the next (older) page. `None` on the last page.
    pub next_cursor: Option<DateTime<Utc>>,
}

/// Append an audit entry inside an open mutation transaction.
pub(crate) async fn append_audit(
    tx: &libsql::Transaction,
    entry: &AuditEntry,
) -> Result<(), DatabaseError> {
    let old_data = snapshot_json(entry.old_data.as_ref())?;
    let new_data = snapshot_json(entry.new_data.as_ref())?;
    tx.execute(
        "INSERT INTO timeline_event_audit (id, event_id, group_id, actor_id, action, old_data, new_data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        libsql::params![
            entry.id.as_str(),
            entry.event_id.as_str(),
            entry.group_id.as_str(),
            entry.actor_id.as_deref(),
            entry.action.as_str(),
            old_data,
            new_data,
            format_timestamp(&entry.created_at)
        ],
    )
    .await?;
    Ok(())
}

async fn collect(mut rows: libsql::Rows) -> Result<Vec<AuditEntry>, DatabaseError> {
    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(row_to_audit(&row)?);
    }
    Ok(entries)
}

impl TimelineStore {
    /// One page of a group's audit log, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_audit(
        &self,
        group_id: &str,
        query: &AuditQuery,
    ) -> Result<AuditPage, DatabaseError> {
        let limit = query
            .limit
            .unwrap_or_else(|| self.audit_page_limit())
            .clamp(1, MAX_AUDIT_PAGE_LIMIT);

        let mut sql = format!("SELECT {AUDIT_COLUMNS} FROM timeline_event_audit WHERE group_id = ?1");
        let mut params: Vec<libsql::Value> = vec![group_id.into()];
        if let Some(before) = &query.before {
            params.push(format_timestamp(before).into());
            sql.push_str(&format!(" AND created_at < ?{}", params.len()));
        }
        sql.push_str(&format!(" ORDER BY created_at DESC, id DESC LIMIT {limit}"));

        let _gate = self.read_gate().await;
        let rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let entries = collect(rows).await?;

        let full = u32::try_from(entries.len()).is_ok_and(|n| n == limit);
        let next_cursor = if full {
            entries.last().map(|entry| entry.created_at)
        } else {
            None
        };
        Ok(AuditPage {
            entries,
            next_cursor,
        })
    }

    /// Every audit entry for one event, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_audit_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<AuditEntry>, DatabaseError> {
        let _gate = self.read_gate().await;
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {AUDIT_COLUMNS} FROM timeline_event_audit
                     WHERE event_id = ?1 ORDER BY created_at DESC, id DESC"
                ),
                [event_id],
            )
            .await?;
        collect(rows).await
    }

    /// # Errors
    ///
    /// `NotFound` if no entry has this id.
    pub async fn get_audit(&self, audit_id: &str) -> Result<AuditEntry, DatabaseError> {
        let _gate = self.read_gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {AUDIT_COLUMNS} FROM timeline_event_audit WHERE id = ?1"),
                [audit_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_audit(&row),
            None => Err(CoreError::audit_not_found(audit_id).into()),
        }
    }
}
