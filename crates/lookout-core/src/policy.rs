//! Mutability policy.
//!
//! Types that mark a discrete change in the situation (missing, found,
//! police contacted) are locked once recorded. Narrative types may have their
//! `details` refined. `event_type` and `label` never change for any event.

use crate::enums::{EventType, Mutability};

/// Classify an event type.
#[must_use]
pub const fn classify(event_type: EventType) -> Mutability {
    match event_type {
        EventType::Missing | EventType::Found | EventType::PoliceContacted => Mutability::Locked,
        EventType::Spotted | EventType::Contacted | EventType::Custom => Mutability::Mutable,
    }
}

/// Whether `details` may be edited for this type.
#[must_use]
pub const fn details_editable(event_type: EventType) -> bool {
    matches!(classify(event_type), Mutability::Mutable)
}
