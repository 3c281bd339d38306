//! Event types, mutability classes, and mutation kinds for Lookout.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`,
//! and the same strings are what the database stores.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// EventType
// ---------------------------------------------------------------------------

/// The closed set of timeline event types.
///
/// ```text
/// missing ─┐
/// found    ├─ situation transitions (locked once recorded)
/// police_contacted ┘
/// spotted ─┐
/// contacted├─ supplementary narrative (details may be refined)
/// custom  ─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Missing,
    Found,
    PoliceContacted,
    Spotted,
    Contacted,
    Custom,
}

impl EventType {
    /// Every variant, in the order the report form lists them.
    pub const ALL: [Self; 6] = [
        Self::Missing,
        Self::Found,
        Self::PoliceContacted,
        Self::Spotted,
        Self::Contacted,
        Self::Custom,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Found => "found",
            Self::PoliceContacted => "police_contacted",
            Self::Spotted => "spotted",
            Self::Contacted => "contacted",
            Self::Custom => "custom",
        }
    }

    /// Label prefilled by the report form when this type is picked.
    #[must_use]
    pub const fn default_label(self) -> &'static str {
        match self {
            Self::Missing => "Report Missing",
            Self::Found => "Found",
            Self::PoliceContacted => "Police Contacted",
            Self::Spotted => "Spotted At...",
            Self::Contacted => "Contacted...",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown event type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Mutability
// ---------------------------------------------------------------------------

/// Whether an event's `details` may change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    Mutable,
    Locked,
}

impl Mutability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mutable => "mutable",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MutationKind
// ---------------------------------------------------------------------------

/// A row-level mutation. Used as the audit `action` and the feed `op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

impl MutationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChangeSource
// ---------------------------------------------------------------------------

/// Which table a change notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    Events,
    Audit,
}

impl ChangeSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Audit => "audit",
        }
    }
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
