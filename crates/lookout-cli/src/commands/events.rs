use lookout_core::enums::EventType;

use crate::cli::GlobalFlags;
use crate::commands::AppContext;
use crate::output::output;

pub async fn create(
    ctx: &AppContext,
    flags: &GlobalFlags,
    group: &str,
    event_type: EventType,
    label: Option<&str>,
    details: Option<&str>,
) -> anyhow::Result<()> {
    let actor = ctx.require_actor()?;
    let label = label.unwrap_or_else(|| event_type.default_label());
    let event = ctx
        .store
        .create_event(group, actor, event_type, label, details)
        .await?;
    output(&event, flags.format)
}

pub async fn edit(
    ctx: &AppContext,
    flags: &GlobalFlags,
    event_id: &str,
    details: &str,
) -> anyhow::Result<()> {
    let event = ctx.store.update_details(event_id, ctx.actor(), details).await?;
    output(&event, flags.format)
}

pub async fn delete(ctx: &AppContext, flags: &GlobalFlags, event_id: &str) -> anyhow::Result<()> {
    let event = ctx.store.delete_event(event_id, ctx.actor()).await?;
    output(&event, flags.format)
}

pub async fn list(ctx: &AppContext, flags: &GlobalFlags, group: &str) -> anyhow::Result<()> {
    let mut events = ctx.store.list_by_group(group).await?;
    if let Some(limit) = flags.limit {
        events.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }
    output(&events, flags.format)
}
