//! State management module
//!
//! Singer bookmarks: one per stream, or one per partition context for
//! streams whose state is partitioned.
//!
//! # Overview
//!
//! - `State` - the `bookmarks` document read from `--state`
//! - `StateManager` - shared handle the engine reads and commits through
//! - `ProgressMarker` - highest replication value seen in a partition

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{compare_replication_values, Bookmark, PartitionState, ProgressMarker, State, StreamState};
