use anyhow::Context;
use chrono::{DateTime, Utc};

use lookout_db::repos::audit::AuditQuery;

use crate::cli::GlobalFlags;
use crate::commands::AppContext;
use crate::output::{ActivityPage, output};

pub async fn list(
    ctx: &AppContext,
    flags: &GlobalFlags,
    group: &str,
    before: Option<&str>,
    event: Option<&str>,
) -> anyhow::Result<()> {
    let page = if let Some(event_id) = event {
        let mut entries = ctx.store.list_audit_for_event(event_id).await?;
        entries.retain(|entry| entry.group_id == group);
        if let Some(limit) = flags.limit {
            entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        ActivityPage {
            entries,
            next_cursor: None,
        }
    } else {
        let before = before.map(parse_cursor).transpose()?;
        let query = AuditQuery {
            limit: flags.limit,
            before,
        };
        let page = ctx.store.list_audit(group, &query).await?;
        ActivityPage {
            entries: page.entries,
            next_cursor: page.next_cursor,
        }
    };
    output(&page, flags.format)
}

pub async fn undo(ctx: &AppContext, flags: &GlobalFlags, audit_id: &str) -> anyhow::Result<()> {
    let event = ctx.store.undo_by_id(ctx.actor(), audit_id).await?;
    output(&event, flags.format)
}

fn parse_cursor(s: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid --before timestamp '{s}'"))
}
