use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EventType, Mutability};
use crate::policy;

/// A status report on a group's timeline.
///
/// Everything except `details` is fixed at creation, and `details` only moves
/// for mutable types.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TimelineEvent {
    pub id: String,
    pub group_id: String,
    pub actor_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub label: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TimelineEvent {
    #[must_use]
    pub const fn mutability(&self) -> Mutability {
        policy::classify(self.event_type)
    }

    #[must_use]
    pub const fn is_editable(&self) -> bool {
        policy::details_editable(self.event_type)
    }
}
