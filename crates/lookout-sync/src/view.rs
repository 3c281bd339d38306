//! Local projection of one group's timeline.
//!
//! `TimelineView` is plain synchronous state: seeded from snapshots, advanced
//! by [`Change`] notifications, and edited optimistically through
//! [`PendingEdit`]s that are later confirmed or reverted.

use std::collections::HashMap;

use lookout_core::change::{Change, ChangePayload};
use lookout_core::entities::{AuditEntry, TimelineEvent};
use lookout_core::enums::MutationKind;
use lookout_core::errors::CoreError;

/// Ticket for an optimistic edit in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an optimistic edit must be confirmed or reverted"]
pub struct PendingEdit {
    event_id: String,
    details: String,
    seq: u64,
}

impl PendingEdit {
    #[must_use]
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// The provisional value shown while the write is in flight.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }
}

#[derive(Debug, Clone)]
struct Pending {
    seq: u64,
    /// Last value known to be persisted.
    durable: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TimelineView {
    group_id: String,
    events: Vec<TimelineEvent>,
    activity: Vec<AuditEntry>,
    activity_limit: usize,
    pending: HashMap<String, Pending>,
    next_seq: u64,
}

impl TimelineView {
    #[must_use]
    pub fn new(group_id: impl Into<String>, activity_limit: usize) -> Self {
        Self {
            group_id: group_id.into(),
            events: Vec::new(),
            activity: Vec::new(),
            activity_limit: activity_limit.max(1),
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Events, most recent first.
    #[must_use]
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Recent audit entries, most recent first.
    #[must_use]
    pub fn activity(&self) -> &[AuditEntry] {
        &self.activity
    }

    #[must_use]
    pub fn get(&self, event_id: &str) -> Option<&TimelineEvent> {
        self.events.iter().find(|e| e.id == event_id)
    }

    #[must_use]
    pub fn has_pending(&self, event_id: &str) -> bool {
        self.pending.contains_key(event_id)
    }

    /// Replace all state with fresh snapshots. Pending edits are forgotten.
    pub fn seed(&mut self, events: Vec<TimelineEvent>, activity: Vec<AuditEntry>) {
        self.events = events;
        self.activity = activity;
        self.activity.truncate(self.activity_limit);
        self.pending.clear();
    }

    /// Apply one notification. Returns whether anything changed.
    pub fn apply(&mut self, change: &Change) -> bool {
        if change.group_id != self.group_id {
            return false;
        }
        match &change.payload {
            ChangePayload::Events { op, old, new } => match op {
                MutationKind::Insert => new.as_ref().is_some_and(|event| self.insert(event)),
                MutationKind::Update => new.as_ref().is_some_and(|event| {
                    if let Some(pending) = self.pending.get_mut(&event.id) {
                        pending.durable.clone_from(&event.details);
                    }
                    self.replace(event)
                }),
                MutationKind::Delete => new
                    .as_ref()
                    .or(old.as_ref())
                    .is_some_and(|event| self.remove(&event.id)),
            },
            ChangePayload::Audit { op, entry } => {
                *op == MutationKind::Insert && self.push_activity(entry)
            }
        }
    }

    fn insert(&mut self, event: &TimelineEvent) -> bool {
        if self.get(&event.id).is_some() {
            return false;
        }
        // Normally index 0; keeps order if a notification arrives late.
        let at = self
            .events
            .iter()
            .position(|e| (&e.created_at, &e.id) < (&event.created_at, &event.id))
            .unwrap_or(self.events.len());
        self.events.insert(at, event.clone());
        true
    }

    /// Swap in a newer copy of an event already in view.
    pub fn replace(&mut self, event: &TimelineEvent) -> bool {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) if slot != event => {
                *slot = event.clone();
                true
            }
            _ => false,
        }
    }

    fn remove(&mut self, event_id: &str) -> bool {
        self.pending.remove(event_id);
        let before = self.events.len();
        self.events.retain(|e| e.id != event_id);
        self.events.len() != before
    }

    fn push_activity(&mut self, entry: &AuditEntry) -> bool {
        if self.activity.iter().any(|a| a.id == entry.id) {
            return false;
        }
        self.activity.insert(0, entry.clone());
        self.activity.truncate(self.activity_limit);
        true
    }

    /// Show `details` immediately, remembering the last persisted value.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event is not in view, `Policy` if its type is
    /// locked, `Validation` if `details` is blank.
    pub fn begin_edit(&mut self, event_id: &str, details: &str) -> Result<PendingEdit, CoreError> {
        let Some(slot) = self.events.iter_mut().find(|e| e.id == event_id) else {
            return Err(CoreError::event_not_found(event_id));
        };
        if !slot.is_editable() {
            return Err(CoreError::Policy(format!("{} events are locked", slot.event_type)));
        }
        if details.trim().is_empty() {
            return Err(CoreError::Validation("details must not be blank".to_string()));
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        let durable = match self.pending.remove(event_id) {
            Some(previous) => previous.durable,
            None => slot.details.clone(),
        };
        slot.details = Some(details.to_string());
        self.pending.insert(event_id.to_string(), Pending { seq, durable });

        Ok(PendingEdit {
            event_id: event_id.to_string(),
            details: details.to_string(),
            seq,
        })
    }

    /// The write behind `edit` succeeded; show the persisted row.
    ///
    /// If a newer edit of the same event is still in flight, only its
    /// baseline moves.
    pub fn confirm(&mut self, edit: PendingEdit, persisted: &TimelineEvent) {
        match self.pending.get(&edit.event_id).map(|pending| pending.seq) {
            Some(seq) if seq != edit.seq => {
                if let Some(pending) = self.pending.get_mut(&edit.event_id) {
                    pending.durable.clone_from(&persisted.details);
                }
            }
            _ => {
                self.pending.remove(&edit.event_id);
                self.replace(persisted);
            }
        }
    }

    /// The write behind `edit` failed; put back the last persisted value.
    pub fn revert(&mut self, edit: PendingEdit) {
        let current = self
            .pending
            .get(&edit.event_id)
            .is_some_and(|pending| pending.seq == edit.seq);
        if !current {
            return;
        }
        if let Some(pending) = self.pending.remove(&edit.event_id) {
            if let Some(slot) = self.events.iter_mut().find(|e| e.id == edit.event_id) {
                slot.details = pending.durable;
            }
        }
    }
}
