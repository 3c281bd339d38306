use clap::{Parser, Subcommand};

use lookout_core::enums::EventType;
use lookout_core::errors::CoreError;

pub mod global;

pub use global::{GlobalFlags, OutputFormat};

/// Top-level CLI parser for the `lookout` binary.
#[derive(Debug, Parser)]
#[command(name = "lookout", version, about = "Lookout - shared search timeline for a care group")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database path (overrides `database.path`)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Acting user id (overrides `general.actor_id`)
    #[arg(long, global = true)]
    pub actor: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            db: self.db.clone(),
            actor: self.actor.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add an event to a group's timeline
    Create {
        #[arg(short, long)]
        group: String,
        /// missing, found, police_contacted, spotted, contacted, custom
        #[arg(short = 't', long = "type", value_parser = parse_event_type)]
        event_type: EventType,
        /// Defaults to the type's standard label
        #[arg(long)]
        label: Option<String>,
        #[arg(short, long)]
        details: Option<String>,
    },
    /// Replace an event's details
    Edit { event_id: String, details: String },
    /// Delete an event
    Delete { event_id: String },
    /// Restore the details an audit entry replaced
    Undo { audit_id: String },
    /// List a group's events, most recent first
    List {
        #[arg(short, long)]
        group: String,
    },
    /// Show a group's activity, most recent first
    Audit {
        #[arg(short, long)]
        group: String,
        /// Only entries older than this RFC 3339 timestamp
        #[arg(long)]
        before: Option<String>,
        /// Only entries for this event
        #[arg(long, conflicts_with = "before")]
        event: Option<String>,
    },
    /// Follow a group's timeline until interrupted
    Watch {
        #[arg(short, long)]
        group: String,
    },
}

fn parse_event_type(s: &str) -> Result<EventType, CoreError> {
    s.parse()
}
