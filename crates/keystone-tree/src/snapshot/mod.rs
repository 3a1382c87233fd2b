//! Snapshots: immutable, structurally shared views of tracked nodes.
//!
//! [`Snapshot`] is the value type; `engine` computes and caches snapshots
//! of live nodes and rebuilds nodes from snapshots.

pub mod codec;
pub mod engine;
pub mod types;

pub use types::{Snapshot, SnapshotKind};
