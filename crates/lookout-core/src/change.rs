//! Realtime change notifications.
//!
//! A `Change` is what the feed fans out after a store mutation commits. The
//! payload mirrors a row-level change event (`operation`, `old_row?`,
//! `new_row?`) with typed rows instead of JSON blobs, so each notification is a
//! full snapshot and can be applied without reading anything else.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{AuditEntry, TimelineEvent};
use crate::enums::{ChangeSource, MutationKind};

/// Body of a change notification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ChangePayload {
    /// A row of `timeline_events` changed.
    Events {
        op: MutationKind,
        old: Option<TimelineEvent>,
        new: Option<TimelineEvent>,
    },
    /// A row was appended to `timeline_event_audit`. Always an insert.
    Audit { op: MutationKind, entry: AuditEntry },
}

/// A change notification scoped to one group.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Change {
    pub group_id: String,
    pub payload: ChangePayload,
}

impl Change {
    #[must_use]
    pub fn event_inserted(event: TimelineEvent) -> Self {
        Self {
            group_id: event.group_id.clone(),
            payload: ChangePayload::Events {
                op: MutationKind::Insert,
                old: None,
                new: Some(event),
            },
        }
    }

    #[must_use]
    pub fn event_updated(old: TimelineEvent, new: TimelineEvent) -> Self {
        Self {
            group_id: new.group_id.clone(),
            payload: ChangePayload::Events {
                op: MutationKind::Update,
                old: Some(old),
                new: Some(new),
            },
        }
    }

    #[must_use]
    pub fn event_deleted(old: TimelineEvent) -> Self {
        Self {
            group_id: old.group_id.clone(),
            payload: ChangePayload::Events {
                op: MutationKind::Delete,
                old: Some(old),
                new: None,
            },
        }
    }

    #[must_use]
    pub fn audit_appended(entry: AuditEntry) -> Self {
        Self {
            group_id: entry.group_id.clone(),
            payload: ChangePayload::Audit {
                op: MutationKind::Insert,
                entry,
            },
        }
    }

    #[must_use]
    pub const fn source(&self) -> ChangeSource {
        match self.payload {
            ChangePayload::Events { .. } => ChangeSource::Events,
            ChangePayload::Audit { .. } => ChangeSource::Audit,
        }
    }

    #[must_use]
    pub const fn op(&self) -> MutationKind {
        match self.payload {
            ChangePayload::Events { op, .. } | ChangePayload::Audit { op, .. } => op,
        }
    }

    /// ID of the timeline event this change concerns.
    #[must_use]
    pub fn event_id(&self) -> Option<&str> {
        match &self.payload {
            ChangePayload::Events { old, new, .. } => new
                .as_ref()
                .or(old.as_ref())
                .map(|event| event.id.as_str()),
            ChangePayload::Audit { entry, .. } => Some(entry.event_id.as_str()),
        }
    }
}
