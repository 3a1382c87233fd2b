//! Patches: emission to listeners, application to live trees, recording.
//!
//! Every committed mutation produces one forward patch and one inverse
//! patch, both relative to the mutated container. [`emit`] rewrites them
//! relative to each listener's subtree root and queues them; queues are
//! flushed when the outermost batch (usually a top-level action) closes.
//!
//! # Operations
//!
//! `add`, `remove` and `replace`, with paths given as key sequences. On
//! arrays `add` inserts and `replace` overwrites; on objects both set.

pub mod apply;
pub mod emit;
pub mod recorder;
pub mod types;

pub use emit::{GlobalPatchListener, PatchListener};
pub use recorder::{PatchRecorder, PatchRecorderEvent, PatchRecorderOptions};
pub use types::Patch;
