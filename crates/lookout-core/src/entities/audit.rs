use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::TimelineEvent;
use crate::enums::MutationKind;

/// State captured on one side of an audited mutation.
///
/// `Details` covers the mutable-field set and is what `insert` and `update`
/// entries record. `Event` holds the whole row and is only used as the
/// `old_data` of a `delete`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditSnapshot {
    Details { details: Option<String> },
    Event(TimelineEvent),
}

impl AuditSnapshot {
    #[must_use]
    pub fn details(details: Option<&str>) -> Self {
        Self::Details {
            details: details.map(String::from),
        }
    }

    /// The `details` value carried by this snapshot, whichever shape it has.
    #[must_use]
    pub fn details_value(&self) -> Option<&str> {
        match self {
            Self::Details { details } => details.as_deref(),
            Self::Event(event) => event.details.as_deref(),
        }
    }
}

/// An append-only audit entry recording one mutation of a timeline event.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    pub event_id: String,
    pub group_id: String,
    /// `None` when no human actor is attributable.
    pub actor_id: Option<String>,
    pub action: MutationKind,
    pub old_data: Option<AuditSnapshot>,
    pub new_data: Option<AuditSnapshot>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Only content edits whose prior state carried details can be reverted.
    #[must_use]
    pub fn is_undoable(&self) -> bool {
        self.action == MutationKind::Update
            && self
                .old_data
                .as_ref()
                .and_then(AuditSnapshot::details_value)
                .is_some()
    }
}
