use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};

use lookout_core::activity::{self, SYSTEM_ACTOR};
use lookout_core::entities::AuditEntry;
use lookout_sync::TimelineClient;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::commands::AppContext;
use crate::output::output;

/// Print the timeline, then one line per new activity entry until Ctrl-C.
///
/// A separate process cannot share the in-process change feed, so this
/// polls snapshots every `feed.poll_interval_ms`.
pub async fn run(ctx: &AppContext, flags: &GlobalFlags, group: &str) -> anyhow::Result<()> {
    let actor = ctx.actor().unwrap_or(SYSTEM_ACTOR);
    let mut client =
        TimelineClient::open(Arc::clone(&ctx.store), None, group, actor, &ctx.config).await?;
    output(&client.view().events().to_vec(), flags.format)?;

    let mut seen = activity_ids(client.view().activity());

    let mut poll = interval(Duration::from_millis(ctx.config.feed.poll_interval_ms.max(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    poll.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {
                if let Err(e) = client.refresh().await {
                    tracing::warn!(group, error = %e, "poll failed");
                    continue;
                }
                let activity = client.view().activity();
                for entry in activity.iter().rev().filter(|entry| !seen.contains(&entry.id)) {
                    print_entry(entry, flags.format)?;
                }
                seen = activity_ids(client.view().activity());
            }
        }
    }

    client.close();
    Ok(())
}

/// Ids of the entries currently in the view. Older ids drop out as the
/// capped activity list moves on.
fn activity_ids(activity: &[AuditEntry]) -> HashSet<String> {
    activity.iter().map(|entry| entry.id.clone()).collect()
}

fn print_entry(entry: &AuditEntry, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => println!(
            "{}  {}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.event_id,
            activity::describe(entry)
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entry)?),
        OutputFormat::Raw => println!("{}", serde_json::to_string(entry)?),
    }
    Ok(())
}
