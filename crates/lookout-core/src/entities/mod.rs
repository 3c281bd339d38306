//! Entity structs for the group timeline.
//!
//! Each entity maps to a table in the libSQL database and doubles as the
//! payload of realtime change notifications. All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema`.

mod audit;
mod event;

pub use audit::{AuditEntry, AuditSnapshot};
pub use event::TimelineEvent;
