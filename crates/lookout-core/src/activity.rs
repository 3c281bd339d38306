//! One-line activity descriptions for audit entries.

use crate::entities::AuditEntry;
use crate::enums::MutationKind;

/// Shown in place of an actor when the mutation was system-initiated.
pub const SYSTEM_ACTOR: &str = "System";

const ACTOR_DISPLAY_CHARS: usize = 6;

/// Short display form of an actor id.
#[must_use]
pub fn actor_display(actor_id: Option<&str>) -> String {
    actor_id.map_or_else(
        || SYSTEM_ACTOR.to_string(),
        |id| id.chars().take(ACTOR_DISPLAY_CHARS).collect(),
    )
}

/// e.g. `"3f9a1c edited an event"`.
#[must_use]
pub fn describe(entry: &AuditEntry) -> String {
    let actor = actor_display(entry.actor_id.as_deref());
    let verb = match entry.action {
        MutationKind::Insert => "added",
        MutationKind::Update => "edited",
        MutationKind::Delete => "deleted",
    };
    format!("{actor} {verb} an event")
}
