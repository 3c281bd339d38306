//! ID prefix constants.
//!
//! IDs are `{prefix}-{8 hex chars}`, generated by the database layer with
//! `randomblob(4)`. Prefixes make ids self-describing in logs and the CLI.

/// Prefix for timeline events.
pub const PREFIX_EVENT: &str = "evt";

/// Prefix for audit entries.
pub const PREFIX_AUDIT: &str = "aud";

/// Whether `id` has the shape produced for `prefix`.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
