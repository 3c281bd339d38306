//! Undo of detail edits.
//!
//! Undo never rewrites history: restoring the previous value is itself a
//! forward `update` with its own audit entry.

use lookout_core::entities::{AuditEntry, TimelineEvent};
use lookout_core::enums::MutationKind;
use lookout_core::errors::CoreError;

use crate::error::DatabaseError;
use crate::service::TimelineStore;

impl TimelineStore {
    /// Restore the details recorded in `entry.old_data`.
    ///
    /// # Errors
    ///
    /// `Policy` unless the entry is an `update`; `Precondition` when it carries
    /// no previous details; otherwise whatever [`Self::update_details`] returns.
    pub async fn undo(
        &self,
        actor_id: Option<&str>,
        entry: &AuditEntry,
    ) -> Result<TimelineEvent, DatabaseError> {
        if entry.action != MutationKind::Update {
            return Err(CoreError::Policy(format!(
                "only update entries can be undone, {} is a {}",
                entry.id, entry.action
            ))
            .into());
        }
        let previous = entry
            .old_data
            .as_ref()
            .and_then(|old| old.details_value())
            .ok_or_else(|| {
                CoreError::Precondition(format!("{} has no previous details", entry.id))
            })?;

        tracing::debug!(audit_id = %entry.id, event_id = %entry.event_id, "undoing edit");
        self.update_details(&entry.event_id, actor_id, previous).await
    }

    /// [`Self::undo`] by audit id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no entry has this id, else as [`Self::undo`].
    pub async fn undo_by_id(
        &self,
        actor_id: Option<&str>,
        audit_id: &str,
    ) -> Result<TimelineEvent, DatabaseError> {
        let entry = self.get_audit(audit_id).await?;
        self.undo(actor_id, &entry).await
    }
}
