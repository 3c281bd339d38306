//! # lookout-core
//!
//! Core types, ID prefixes, and error types for the Lookout group timeline.
//!
//! This crate provides the foundational types shared across all Lookout crates:
//! - Entity structs for timeline events and audit entries
//! - The closed event-type enumeration and its mutability policy
//! - Change notifications carried by the realtime feed
//! - Cross-cutting error types
//! - Human-readable activity lines for audit entries

pub mod activity;
pub mod change;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod policy;
