//! Repository methods, one module per concern. Each is an `impl TimelineStore`
//! block.

pub mod audit;
pub mod events;
pub mod undo;
