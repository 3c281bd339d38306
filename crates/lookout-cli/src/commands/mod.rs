use std::sync::Arc;

use anyhow::Context;

use lookout_config::LookoutConfig;
use lookout_db::service::TimelineStore;

use crate::cli::{Commands, GlobalFlags};

pub mod audit;
pub mod events;
pub mod watch;

/// Everything a command handler needs.
pub struct AppContext {
    pub config: LookoutConfig,
    pub store: Arc<TimelineStore>,
    actor: Option<String>,
}

impl AppContext {
    /// Load config, apply flag overrides and open the store with a
    /// config-sized change feed.
    pub async fn init(flags: &GlobalFlags) -> anyhow::Result<Self> {
        let mut config = LookoutConfig::load_with_dotenv().context("failed to load configuration")?;
        if let Some(db) = &flags.db {
            config.database.path.clone_from(db);
        }
        let actor = flags
            .actor
            .clone()
            .or_else(|| config.general.actor().map(String::from));

        let store = TimelineStore::open_with_feed(&config)
            .await
            .with_context(|| format!("failed to open timeline database at {}", config.database.path))?;
        Ok(Self {
            config,
            store: Arc::new(store),
            actor,
        })
    }

    /// The acting user, if one was given. `None` is recorded as a system change.
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// The acting user, for operations that must be attributed.
    pub fn require_actor(&self) -> anyhow::Result<&str> {
        self.actor()
            .context("no actor: pass --actor or set general.actor_id")
    }
}

pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Create {
            group,
            event_type,
            label,
            details,
        } => events::create(ctx, flags, &group, event_type, label.as_deref(), details.as_deref()).await,
        Commands::Edit { event_id, details } => events::edit(ctx, flags, &event_id, &details).await,
        Commands::Delete { event_id } => events::delete(ctx, flags, &event_id).await,
        Commands::List { group } => events::list(ctx, flags, &group).await,
        Commands::Undo { audit_id } => audit::undo(ctx, flags, &audit_id).await,
        Commands::Audit {
            group,
            before,
            event,
        } => audit::list(ctx, flags, &group, before.as_deref(), event.as_deref()).await,
        Commands::Watch { group } => watch::run(ctx, flags, &group).await,
    }
}
