use chrono::{DateTime, Utc};
use serde::Serialize;

use lookout_core::activity;
use lookout_core::entities::{AuditEntry, TimelineEvent};

use crate::cli::OutputFormat;

pub mod table;

/// Something that can be shown as rows of a fixed set of columns.
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn rows(&self) -> Vec<Vec<String>>;
}

/// Render a response to a string in the requested format.
pub fn render<T: Serialize + Tabular>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => {
            let rows = value.rows();
            if rows.is_empty() {
                return Ok(String::from("(no rows)"));
            }
            Ok(table::render_table(T::headers(), &rows))
        }
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a response in the requested format.
pub fn output<T: Serialize + Tabular>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn event_row(event: &TimelineEvent) -> Vec<String> {
    vec![
        event.id.clone(),
        event.event_type.to_string(),
        event.label.clone(),
        event.details.clone().unwrap_or_else(|| String::from("-")),
        event.actor_id.clone(),
        timestamp(&event.created_at),
    ]
}

const EVENT_HEADERS: &[&str] = &["id", "type", "label", "details", "actor", "created_at"];

impl Tabular for TimelineEvent {
    fn headers() -> &'static [&'static str] {
        EVENT_HEADERS
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![event_row(self)]
    }
}

impl Tabular for Vec<TimelineEvent> {
    fn headers() -> &'static [&'static str] {
        EVENT_HEADERS
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter().map(event_row).collect()
    }
}

/// A page of activity as printed by `lookout audit`.
#[derive(Debug, Serialize)]
pub struct ActivityPage {
    pub entries: Vec<AuditEntry>,
    pub next_cursor: Option<DateTime<Utc>>,
}

impl Tabular for ActivityPage {
    fn headers() -> &'static [&'static str] {
        &["id", "event_id", "summary", "undoable", "created_at"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.entries
            .iter()
            .map(|entry| {
                vec![
                    entry.id.clone(),
                    entry.event_id.clone(),
                    activity::describe(entry),
                    if entry.is_undoable() { "yes" } else { "no" }.to_string(),
                    timestamp(&entry.created_at),
                ]
            })
            .collect()
    }
}
