//! # lookout-sync
//!
//! Client-side reconciliation for a group timeline.
//!
//! [`TimelineView`] is the local projection: events and recent activity,
//! advanced by change notifications and edited optimistically.
//! [`TimelineClient`] keeps one view in step with a [`lookout_db::service::TimelineStore`]
//! and a [`lookout_feed::ChangeFeed`], falling back to snapshot polling when
//! no live subscription is available.
//!
//! Concurrent edits of the same event resolve last-write-wins: whichever
//! write commits last is what every view converges to.

pub mod client;
pub mod error;
pub mod view;

pub use client::{SyncMode, TimelineClient};
pub use error::SyncError;
pub use view::{PendingEdit, TimelineView};
