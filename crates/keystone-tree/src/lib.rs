//! keystone-tree: an observable, mutable state tree.
//!
//! Plain data placed in a [`Store`] becomes a tree of tracked nodes. Every
//! write goes through the store, which keeps parent links current, caches
//! structurally shared [`Snapshot`]s, and emits forward and inverse
//! [`Patch`]es to listeners. Model types attach named actions to object
//! nodes; top-level action calls are described as serializable
//! [`ActionCall`]s that can be replayed against a replica tree.
//!
//! ```
//! use keystone_tree::{Store, StoreConfig};
//! use serde_json::json;
//!
//! let mut store = Store::new(StoreConfig::default());
//! let todos = store.tweak(json!({"items": []})).unwrap();
//! let items = store.get(todos, "items").unwrap().unwrap().as_node().unwrap();
//! store.push(items, json!({"text": "write docs", "done": false})).unwrap();
//! let first = store.get_index(items, 0).unwrap().unwrap().as_node().unwrap();
//! assert_eq!(store.path_of(first), vec!["items", "0"]);
//! assert_eq!(
//!     store.get_snapshot(todos).unwrap(),
//!     json!({"items": [{"text": "write docs", "done": false}]})
//! );
//! ```

pub mod action;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod node;
pub mod patch;
pub mod path;
pub mod snapshot;
pub mod store;
pub mod tweak;

pub use action::{
    action_call_from_str, action_call_to_string, deserialize_action_call, serialize_action_call,
    wrap_in_action, ActionCall, ActionFn, ActionListener,
};
pub use config::StoreConfig;
pub use error::{Error, ErrorKind, Result};
pub use model::{ModelType, SimpleImportFn, SimpleValue, SnapshotProcessor};
pub use node::{NodeId, NodeKind, Slot};
pub use patch::{
    GlobalPatchListener, Patch, PatchListener, PatchRecorder, PatchRecorderEvent,
    PatchRecorderOptions,
};
pub use path::{format_path, Path};
pub use snapshot::{Snapshot, SnapshotKind};
pub use store::{ListenerId, Store};
pub use tweak::Payload;
