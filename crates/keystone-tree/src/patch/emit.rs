//! Patch listeners and delivery.
//!
//! Emission never calls a listener directly: the patch pair is rewritten for
//! every interested listener and pushed to that listener's queue. Queues are
//! drained by [`Store::flush_patches`], which runs when the outermost batch
//! closes (or after each mutation when coalescing is off). A disposed
//! listener receives no new patches but still gets what was already queued.

use crate::error::Result;
use crate::node::NodeId;
use crate::patch::Patch;
use crate::path::Path;
use crate::store::{ListenerId, Store};

/// Called with `(patches, inverse_patches)`, paths relative to the
/// subtree root the listener was registered on.
pub type PatchListener = Box<dyn FnMut(&[Patch], &[Patch])>;

/// Called with `(tree_root, patches, inverse_patches)`, paths relative to
/// `tree_root`. Invoked once per affected tree per flush.
pub type GlobalPatchListener = Box<dyn FnMut(NodeId, &[Patch], &[Patch])>;

enum Callback {
    Subtree { root: NodeId, listener: PatchListener },
    Global(GlobalPatchListener),
}

struct Queued {
    tree_root: NodeId,
    patch: Patch,
    inverse: Patch,
}

struct Entry {
    id: ListenerId,
    callback: Callback,
    queue: Vec<Queued>,
    disposed: bool,
}

#[derive(Default)]
pub(crate) struct PatchListeners {
    entries: Vec<Entry>,
}

impl PatchListeners {
    fn push(&mut self, id: ListenerId, callback: Callback) {
        self.entries.push(Entry {
            id,
            callback,
            queue: Vec::new(),
            disposed: false,
        });
    }

    pub(crate) fn dispose(&mut self, id: ListenerId) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id && !e.disposed) {
            Some(entry) => {
                entry.disposed = true;
                true
            }
            None => false,
        }
    }

    /// Dispose every listener registered on `root` (the node is going away).
    pub(crate) fn drop_subtree_root(&mut self, root: NodeId) {
        for entry in &mut self.entries {
            if matches!(entry.callback, Callback::Subtree { root: r, .. } if r == root) {
                entry.disposed = true;
            }
        }
    }

    fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| !e.queue.is_empty())
    }
}

impl Store {
    /// Listen to mutations at or below `subtree_root`.
    pub fn on_patches<F>(&mut self, subtree_root: NodeId, listener: F) -> Result<ListenerId>
    where
        F: FnMut(&[Patch], &[Patch]) + 'static,
    {
        self.ensure(subtree_root)?;
        let id = self.next_listener_id();
        self.patch_listeners.push(
            id,
            Callback::Subtree {
                root: subtree_root,
                listener: Box::new(listener),
            },
        );
        Ok(id)
    }

    /// Listen to mutations in every tree of the store.
    pub fn on_global_patches<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(NodeId, &[Patch], &[Patch]) + 'static,
    {
        let id = self.next_listener_id();
        self.patch_listeners.push(id, Callback::Global(Box::new(listener)));
        id
    }

    /// Route one mutation of `node` to every interested listener.
    pub(crate) fn emit_patch(&mut self, node: NodeId, patch: Patch, inverse: Patch) {
        tracing::trace!(node = %node, op = patch.op_name(), path = ?patch.path(), "patch emitted");

        let tree_root = self.root_of(node);
        let routes: Vec<(usize, Path)> = self
            .patch_listeners
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.disposed)
            .filter_map(|(index, entry)| {
                let prefix = match &entry.callback {
                    Callback::Subtree { root, .. } => self.path_from(*root, node)?,
                    Callback::Global(_) => self.path_of(node),
                };
                Some((index, prefix))
            })
            .collect();

        for (index, prefix) in routes {
            self.patch_listeners.entries[index].queue.push(Queued {
                tree_root,
                patch: patch.prefixed(&prefix),
                inverse: inverse.prefixed(&prefix),
            });
        }

        if self.batch_depth == 0 || !self.config.coalesce_action_patches {
            self.flush_patches();
        }
    }

    /// Deliver every queued patch list, then forget disposed listeners.
    pub(crate) fn flush_patches(&mut self) {
        if !self.patch_listeners.has_pending() {
            self.patch_listeners.entries.retain(|e| !e.disposed);
            return;
        }
        for entry in &mut self.patch_listeners.entries {
            if entry.queue.is_empty() {
                continue;
            }
            let queue = std::mem::take(&mut entry.queue);
            tracing::trace!(listener = entry.id.0, patches = queue.len(), "flushing patches");
            match &mut entry.callback {
                Callback::Subtree { listener, .. } => {
                    let (patches, inverse): (Vec<Patch>, Vec<Patch>) =
                        queue.into_iter().map(|q| (q.patch, q.inverse)).unzip();
                    listener(&patches, &inverse);
                }
                Callback::Global(listener) => {
                    for (tree_root, patches, inverse) in group_by_tree(queue) {
                        listener(tree_root, &patches, &inverse);
                    }
                }
            }
        }
        self.patch_listeners.entries.retain(|e| !e.disposed);
    }
}

/// Split a global queue per tree root, keeping first-appearance order.
fn group_by_tree(queue: Vec<Queued>) -> Vec<(NodeId, Vec<Patch>, Vec<Patch>)> {
    let mut groups: Vec<(NodeId, Vec<Patch>, Vec<Patch>)> = Vec::new();
    for queued in queue {
        match groups.iter_mut().find(|(root, _, _)| *root == queued.tree_root) {
            Some((_, patches, inverse)) => {
                patches.push(queued.patch);
                inverse.push(queued.inverse);
            }
            None => groups.push((queued.tree_root, vec![queued.patch], vec![queued.inverse])),
        }
    }
    groups
}
