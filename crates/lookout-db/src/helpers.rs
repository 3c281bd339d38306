//! Row-to-entity parsing helpers.
//!
//! Timestamps are written as fixed-width RFC 3339 with microseconds and a `Z`
//! suffix so that lexical order in SQL equals time order.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use lookout_core::entities::{AuditEntry, AuditSnapshot, TimelineEvent};

use crate::error::DatabaseError;

/// Column list shared by every event SELECT; matches [`row_to_event`].
pub(crate) const EVENT_COLUMNS: &str = "id, group_id, actor_id, type, label, details, created_at";

/// Column list shared by every audit SELECT; matches [`row_to_audit`].
pub(crate) const AUDIT_COLUMNS: &str =
    "id, event_id, group_id, actor_id, action, old_data, new_data, created_at";

/// Format a timestamp for storage.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The current time at storage precision.
#[must_use]
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string is not RFC 3339.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Decode an audit snapshot column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty value is not a valid snapshot.
pub fn parse_snapshot(s: Option<&str>) -> Result<Option<AuditSnapshot>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => serde_json::from_str(s)
            .map(Some)
            .map_err(|e| DatabaseError::Query(format!("Invalid audit snapshot: {e}"))),
        _ => Ok(None),
    }
}

/// Encode an audit snapshot for storage.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn snapshot_json(snapshot: Option<&AuditSnapshot>) -> Result<Option<String>, DatabaseError> {
    snapshot
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::Other(e.into()))
}

/// Treat blank input as absent; otherwise keep it verbatim.
#[must_use]
pub fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

pub(crate) fn row_to_event(row: &libsql::Row) -> Result<TimelineEvent, DatabaseError> {
    Ok(TimelineEvent {
        id: row.get::<String>(0)?,
        group_id: row.get::<String>(1)?,
        actor_id: row.get::<String>(2)?,
        event_type: parse_enum(&row.get::<String>(3)?)?,
        label: row.get::<String>(4)?,
        details: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

pub(crate) fn row_to_audit(row: &libsql::Row) -> Result<AuditEntry, DatabaseError> {
    Ok(AuditEntry {
        id: row.get::<String>(0)?,
        event_id: row.get::<String>(1)?,
        group_id: row.get::<String>(2)?,
        actor_id: get_opt_string(row, 3)?,
        action: parse_enum(&row.get::<String>(4)?)?,
        old_data: parse_snapshot(get_opt_string(row, 5)?.as_deref())?,
        new_data: parse_snapshot(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lookout_core::enums::{EventType, MutationKind};

    #[test]
    fn timestamps_are_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        let (fa, fb) = (format_timestamp(&a), format_timestamp(&b));
        assert_eq!(fa, "2026-03-01T09:00:00.000000Z");
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert_eq!(parse_datetime(&fb).unwrap(), b);
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn parse_enum_variants() {
        assert_eq!(parse_enum::<EventType>("police_contacted").unwrap(), EventType::PoliceContacted);
        assert_eq!(parse_enum::<MutationKind>("delete").unwrap(), MutationKind::Delete);
        assert!(parse_enum::<MutationKind>("upsert").is_err());
    }

    #[test]
    fn snapshot_column_roundtrip() {
        let snap = AuditSnapshot::details(Some("Mall"));
        let json = snapshot_json(Some(&snap)).unwrap().unwrap();
        assert!(json.contains("\"kind\":\"details\""));
        assert_eq!(parse_snapshot(Some(&json)).unwrap(), Some(snap));
        assert_eq!(parse_snapshot(None).unwrap(), None);
        assert_eq!(snapshot_json(None).unwrap(), None);
    }

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some("")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" Mall ")), Some(" Mall "));
    }
}
