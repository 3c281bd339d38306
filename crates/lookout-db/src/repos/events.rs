//! Timeline event repository: create, edit details, delete, list.

use lookout_core::change::Change;
use lookout_core::entities::{AuditEntry, AuditSnapshot, TimelineEvent};
use lookout_core::enums::{EventType, MutationKind};
use lookout_core::errors::CoreError;
use lookout_core::ids::{PREFIX_AUDIT, PREFIX_EVENT};

use crate::error::DatabaseError;
use crate::generate_id;
use crate::helpers::{EVENT_COLUMNS, format_timestamp, non_blank, row_to_event};
use crate::repos::audit::append_audit;
use crate::service::{TimelineStore, finish, next_commit_timestamp};

fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

pub(crate) async fn fetch_event(
    conn: &libsql::Connection,
    event_id: &str,
) -> Result<Option<TimelineEvent>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {EVENT_COLUMNS} FROM timeline_events WHERE id = ?1"),
            [event_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_event(&row)?)),
        None => Ok(None),
    }
}

impl TimelineStore {
    /// Create an event and its `insert` audit entry.
    ///
    /// The label is stored trimmed; blank `details` are stored as NULL.
    ///
    /// # Errors
    ///
    /// `Validation` if `group_id`, `actor_id` or `label` is blank.
    pub async fn create_event(
        &self,
        group_id: &str,
        actor_id: &str,
        event_type: EventType,
        label: &str,
        details: Option<&str>,
    ) -> Result<TimelineEvent, DatabaseError> {
        require("group_id", group_id)?;
        require("actor_id", actor_id)?;
        require("label", label)?;
        let details = non_blank(details);

        let _gate = self.write_gate().await;
        let tx = self.db().conn().transaction().await?;
        let result: Result<_, DatabaseError> = async {
            let created_at = next_commit_timestamp(&tx, group_id).await?;
            let event = TimelineEvent {
                id: generate_id(&tx, PREFIX_EVENT).await?,
                group_id: group_id.to_string(),
                actor_id: actor_id.to_string(),
                event_type,
                label: label.trim().to_string(),
                details: details.map(String::from),
                created_at,
            };
            tx.execute(
                "INSERT INTO timeline_events (id, group_id, actor_id, type, label, details, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    event.id.as_str(),
                    event.group_id.as_str(),
                    event.actor_id.as_str(),
                    event.event_type.as_str(),
                    event.label.as_str(),
                    event.details.as_deref(),
                    format_timestamp(&created_at)
                ],
            )
            .await?;

            let entry = AuditEntry {
                id: generate_id(&tx, PREFIX_AUDIT).await?,
                event_id: event.id.clone(),
                group_id: event.group_id.clone(),
                actor_id: Some(actor_id.to_string()),
                action: MutationKind::Insert,
                old_data: None,
                new_data: Some(AuditSnapshot::details(details)),
                created_at,
            };
            append_audit(&tx, &entry).await?;
            Ok((event, entry))
        }
        .await;
        let (event, entry) = finish(tx, result).await?;

        tracing::debug!(event_id = %event.id, group_id, event_type = %event_type, "event created");
        self.publish([Change::event_inserted(event.clone()), Change::audit_appended(entry)]);
        Ok(event)
    }

    /// Replace an event's details.
    ///
    /// Blank or unchanged details are a no-op: the current row is returned and
    /// no audit entry is written.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event does not exist, `Policy` if its type is locked.
    pub async fn update_details(
        &self,
        event_id: &str,
        actor_id: Option<&str>,
        details: &str,
    ) -> Result<TimelineEvent, DatabaseError> {
        let _gate = self.write_gate().await;
        let tx = self.db().conn().transaction().await?;
        let result: Result<_, DatabaseError> = async {
            let current = fetch_event(&tx, event_id)
                .await?
                .ok_or_else(|| CoreError::event_not_found(event_id))?;
            if !current.is_editable() {
                return Err(CoreError::Policy(format!(
                    "{} events are locked",
                    current.event_type
                ))
                .into());
            }
            if details.trim().is_empty() || current.details.as_deref() == Some(details) {
                return Ok((current, None));
            }

            let updated_at = next_commit_timestamp(&tx, &current.group_id).await?;
            tx.execute(
                "UPDATE timeline_events SET details = ?1 WHERE id = ?2",
                libsql::params![details, event_id],
            )
            .await?;

            let entry = AuditEntry {
                id: generate_id(&tx, PREFIX_AUDIT).await?,
                event_id: current.id.clone(),
                group_id: current.group_id.clone(),
                actor_id: actor_id.map(String::from),
                action: MutationKind::Update,
                old_data: Some(AuditSnapshot::details(current.details.as_deref())),
                new_data: Some(AuditSnapshot::details(Some(details))),
                created_at: updated_at,
            };
            append_audit(&tx, &entry).await?;
            let updated = TimelineEvent {
                details: Some(details.to_string()),
                ..current.clone()
            };
            Ok((updated, Some((current, entry))))
        }
        .await;

        match finish(tx, result).await? {
            (event, Some((old, entry))) => {
                tracing::debug!(event_id, group_id = %event.group_id, "event details updated");
                self.publish([
                    Change::event_updated(old, event.clone()),
                    Change::audit_appended(entry),
                ]);
                Ok(event)
            }
            (event, None) => {
                tracing::debug!(event_id, "details unchanged, nothing written");
                Ok(event)
            }
        }
    }

    /// Delete an event. The `delete` audit entry keeps the full removed row.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event does not exist, `Policy` if its type is locked.
    pub async fn delete_event(
        &self,
        event_id: &str,
        actor_id: Option<&str>,
    ) -> Result<TimelineEvent, DatabaseError> {
        let _gate = self.write_gate().await;
        let tx = self.db().conn().transaction().await?;
        let result: Result<_, DatabaseError> = async {
            let current = fetch_event(&tx, event_id)
                .await?
                .ok_or_else(|| CoreError::event_not_found(event_id))?;
            if !current.is_editable() {
                return Err(CoreError::Policy(format!(
                    "{} events cannot be deleted",
                    current.event_type
                ))
                .into());
            }

            let deleted_at = next_commit_timestamp(&tx, &current.group_id).await?;
            tx.execute("DELETE FROM timeline_events WHERE id = ?1", [event_id])
                .await?;

            let entry = AuditEntry {
                id: generate_id(&tx, PREFIX_AUDIT).await?,
                event_id: current.id.clone(),
                group_id: current.group_id.clone(),
                actor_id: actor_id.map(String::from),
                action: MutationKind::Delete,
                old_data: Some(AuditSnapshot::Event(current.clone())),
                new_data: None,
                created_at: deleted_at,
            };
            append_audit(&tx, &entry).await?;
            Ok((current, entry))
        }
        .await;
        let (event, entry) = finish(tx, result).await?;

        tracing::debug!(event_id, group_id = %event.group_id, "event deleted");
        self.publish([Change::event_deleted(event.clone()), Change::audit_appended(entry)]);
        Ok(event)
    }

    /// All events of a group, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_by_group(&self, group_id: &str) -> Result<Vec<TimelineEvent>, DatabaseError> {
        let _gate = self.read_gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM timeline_events
                     WHERE group_id = ?1 ORDER BY created_at DESC, id DESC"
                ),
                [group_id],
            )
            .await?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(row_to_event(&row)?);
        }
        Ok(events)
    }

    /// # Errors
    ///
    /// `NotFound` if the event does not exist.
    pub async fn get_event(&self, event_id: &str) -> Result<TimelineEvent, DatabaseError> {
        let _gate = self.read_gate().await;
        fetch_event(self.db().conn(), event_id)
            .await?
            .ok_or_else(|| CoreError::event_not_found(event_id).into())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::helpers::test_store;
    use lookout_core::enums::EventType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[tokio::test]
    async fn create_trims_label_and_nulls_blank_details() {
        let store = test_store().await;
        let event = store
            .create_event("g1", "u1", EventType::Custom, "  Checked hospitals ", Some("   "))
            .await
            .unwrap();
        assert_eq!(event.label, "Checked hospitals");
        assert_eq!(event.details, None);
        assert_eq!(store.get_event(&event.id).await.unwrap(), event);
    }

    #[rstest]
    #[case("", "u1", "Found")]
    #[case("g1", " ", "Found")]
    #[case("g1", "u1", "   ")]
    #[tokio::test]
    async fn create_rejects_blank_fields(
        #[case] group: &str,
        #[case] actor: &str,
        #[case] label: &str,
    ) {
        let store = test_store().await;
        let err = store
            .create_event(group, actor, EventType::Found, label, None)
            .await
            .unwrap_err();
        assert!(err.is_validation(), "expected validation error, got {err}");
        assert!(store.list_by_group("g1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_event_is_not_found() {
        let store = test_store().await;
        let err = store
            .update_details("evt-deadbeef", Some("u1"), "Mall")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_same_value_is_noop() {
        let store = test_store().await;
        let event = store
            .create_event("g1", "u1", EventType::Spotted, "Spotted At...", Some("Mall"))
            .await
            .unwrap();
        let same = store
            .update_details(&event.id, Some("u2"), "Mall")
            .await
            .unwrap();
        assert_eq!(same, event);
        let blank = store.update_details(&event.id, Some("u2"), "  ").await.unwrap();
        assert_eq!(blank, event);
        assert_eq!(store.list_audit_for_event(&event.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_locked_event_is_policy_error() {
        let store = test_store().await;
        let event = store
            .create_event("g1", "u1", EventType::PoliceContacted, "Police Contacted", None)
            .await
            .unwrap();
        let err = store.delete_event(&event.id, Some("u1")).await.unwrap_err();
        assert!(err.is_policy());
        assert_eq!(store.get_event(&event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn list_is_scoped_to_group() {
        let store = test_store().await;
        store
            .create_event("g1", "u1", EventType::Missing, "Report Missing", None)
            .await
            .unwrap();
        store
            .create_event("g2", "u1", EventType::Found, "Found", None)
            .await
            .unwrap();
        let g1 = store.list_by_group("g1").await.unwrap();
        assert_eq!(g1.len(), 1);
        assert_eq!(g1[0].group_id, "g1");
    }
}
