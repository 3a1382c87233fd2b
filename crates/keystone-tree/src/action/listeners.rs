//! Action call listeners.

use crate::action::ActionCall;
use crate::error::Result;
use crate::node::NodeId;
use crate::path::Path;
use crate::snapshot::Snapshot;
use crate::store::{ListenerId, Store};

/// Receives top-level action calls made at or below a subtree root, with
/// the target path relative to that root.
pub type ActionListener = Box<dyn FnMut(&ActionCall)>;

struct Entry {
    id: ListenerId,
    subtree_root: NodeId,
    listener: ActionListener,
}

#[derive(Default)]
pub(crate) struct ActionListeners {
    entries: Vec<Entry>,
}

impl ActionListeners {
    pub(crate) fn dispose(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub(crate) fn drop_subtree_root(&mut self, root: NodeId) {
        self.entries.retain(|e| e.subtree_root != root);
    }
}

impl Store {
    /// Listen to top-level action calls on nodes at or below `subtree_root`.
    pub fn on_action_call<F>(&mut self, subtree_root: NodeId, listener: F) -> Result<ListenerId>
    where
        F: FnMut(&ActionCall) + 'static,
    {
        self.ensure(subtree_root)?;
        let id = self.next_listener_id();
        self.action_listeners.entries.push(Entry {
            id,
            subtree_root,
            listener: Box::new(listener),
        });
        Ok(id)
    }

    pub(crate) fn notify_action_listeners(
        &mut self,
        target: NodeId,
        name: &str,
        args: &[Snapshot],
    ) {
        let routes: Vec<(usize, Path)> = self
            .action_listeners
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| Some((index, self.path_from(entry.subtree_root, target)?)))
            .collect();
        for (index, target_path) in routes {
            let call = ActionCall::new(target_path, name, args.to_vec());
            (self.action_listeners.entries[index].listener)(&call);
        }
    }
}
