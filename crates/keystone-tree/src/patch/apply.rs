//! Applying patches and snapshots to live trees.
//!
//! Both entry points run as built-in actions, so they batch their patches
//! into one notification and are recorded by action listeners like any
//! other top-level action call.

use crate::constants::{APPLY_PATCHES_ACTION, APPLY_SNAPSHOT_ACTION};
use crate::error::{Error, Result};
use crate::node::{NodeId, NodeKind, Slot};
use crate::patch::types::patches_to_snapshot;
use crate::patch::Patch;
use crate::snapshot::{Snapshot, SnapshotKind};
use crate::store::Store;
use crate::tweak::Mutation;

impl Store {
    /// Apply `patches` in order to the tree rooted at `root`.
    ///
    /// Patches applied before a failing one stay applied.
    pub fn apply_patches(&mut self, root: NodeId, patches: &[Patch]) -> Result<()> {
        let arg = patches_to_snapshot(patches)?;
        self.run_action(APPLY_PATCHES_ACTION, root, &[arg], |store| {
            for patch in patches {
                store.apply_patch(root, patch)?;
            }
            Ok(Snapshot::null())
        })
        .map(|_| ())
    }

    /// Undo a change by applying its inverse patches last-to-first.
    pub fn apply_patches_reversed(&mut self, root: NodeId, inverse: &[Patch]) -> Result<()> {
        let reversed: Vec<Patch> = inverse.iter().rev().cloned().collect();
        self.apply_patches(root, &reversed)
    }

    /// Bring `node` to the state described by `snapshot`, reusing existing
    /// child nodes wherever the shapes line up.
    ///
    /// A model node only accepts a snapshot with its own type and id.
    pub fn apply_snapshot(&mut self, node: NodeId, snapshot: &Snapshot) -> Result<()> {
        self.check_reconcilable(node, snapshot)?;
        self.run_action(APPLY_SNAPSHOT_ACTION, node, &[snapshot.clone()], |store| {
            store.reconcile(node, snapshot)?;
            Ok(Snapshot::null())
        })
        .map(|_| ())
    }

    fn apply_patch(&mut self, root: NodeId, patch: &Patch) -> Result<()> {
        let path = patch.path();
        let not_found = || Error::PatchPathNotFound { path: path.to_vec() };

        let Some((last, parent_path)) = path.split_last() else {
            return match patch {
                Patch::Replace { value, .. } => {
                    self.check_reconcilable(root, value)?;
                    self.reconcile(root, value)
                }
                _ => Err(not_found()),
            };
        };
        let parent = self.resolve_path(root, parent_path).ok_or_else(not_found)?;
        let key = last.clone();

        match patch {
            Patch::Add { value, .. } => match self.kind(parent)? {
                NodeKind::Array => {
                    let index = last.parse::<usize>().map_err(|_| not_found())?;
                    if index > self.len(parent)? {
                        return Err(not_found());
                    }
                    self.commit(parent, Mutation::Insert { index, value: value.clone().into() })?;
                }
                _ => {
                    self.commit(parent, Mutation::Set { key, value: value.clone().into() })?;
                }
            },
            Patch::Remove { .. } => {
                if self.get(parent, last)?.is_none() {
                    return Err(not_found());
                }
                self.commit(parent, Mutation::Delete { key })?;
            }
            Patch::Replace { value, .. } => match self.get(parent, last)?.ok_or_else(not_found)? {
                Slot::Node(existing) if self.same_model(existing, value) => {
                    self.reconcile(existing, value)?;
                }
                _ => {
                    self.commit(parent, Mutation::Set { key, value: value.clone().into() })?;
                }
            },
        }
        Ok(())
    }

    /// True when `node` is a model with the type and id `snapshot` carries.
    fn same_model(&self, node: NodeId, snapshot: &Snapshot) -> bool {
        match (snapshot.model_type(), snapshot.model_id()) {
            (Some(ty), Some(id)) => {
                self.model_type_of(node).as_deref() == Some(ty)
                    && self.model_id_of(node).as_deref() == Some(id)
            }
            _ => false,
        }
    }

    /// Plain containers of the same kind, or the same model.
    fn can_reconcile(&self, node: NodeId, snapshot: &Snapshot) -> Result<bool> {
        Ok(match (self.kind(node)?, snapshot.kind()) {
            (NodeKind::Array, SnapshotKind::Array(_)) => true,
            (NodeKind::Object, SnapshotKind::Object(_)) => {
                match (self.model_type_of(node), snapshot.model_type()) {
                    (None, None) => true,
                    (Some(_), Some(_)) => self.same_model(node, snapshot),
                    _ => false,
                }
            }
            _ => false,
        })
    }

    fn check_reconcilable(&self, node: NodeId, snapshot: &Snapshot) -> Result<()> {
        if self.can_reconcile(node, snapshot)? {
            return Ok(());
        }
        Err(Error::InvalidSnapshot(
            match (self.model_type_of(node), self.model_id_of(node)) {
                (Some(ty), Some(id)) => {
                    format!("snapshot {snapshot} is not model '{ty}' with id '{id}'")
                }
                _ => format!("snapshot {snapshot} does not match the shape of node {node}"),
            },
        ))
    }

    /// Update `node` in place so its snapshot equals `snapshot`.
    pub(crate) fn reconcile(&mut self, node: NodeId, snapshot: &Snapshot) -> Result<()> {
        match (self.kind(node)?, snapshot.kind()) {
            (NodeKind::Object, SnapshotKind::Object(entries)) => {
                for key in self.keys(node)? {
                    if !entries.contains_key(&key) {
                        self.commit(node, Mutation::Delete { key })?;
                    }
                }
                for (key, value) in entries {
                    self.reconcile_entry(node, key, value)?;
                }
                Ok(())
            }
            (NodeKind::Array, SnapshotKind::Array(items)) => {
                let len = self.len(node)?;
                for index in (items.len()..len).rev() {
                    self.commit(node, Mutation::Delete { key: index.to_string() })?;
                }
                for (index, item) in items.iter().enumerate() {
                    if index < len {
                        self.reconcile_entry(node, &index.to_string(), item)?;
                    } else {
                        self.commit(node, Mutation::Insert { index, value: item.clone().into() })?;
                    }
                }
                Ok(())
            }
            _ => Err(Error::InvalidSnapshot(format!(
                "snapshot {snapshot} does not match the shape of node {node}"
            ))),
        }
    }

    fn reconcile_entry(&mut self, node: NodeId, key: &str, value: &Snapshot) -> Result<()> {
        match self.get(node, key)? {
            Some(Slot::Leaf(current)) if current == *value => Ok(()),
            Some(Slot::Node(child)) => {
                if self.get_snapshot(child)? == *value {
                    Ok(())
                } else if self.can_reconcile(child, value)? {
                    self.reconcile(child, value)
                } else {
                    self.set(node, key, value.clone())
                }
            }
            _ => self.set(node, key, value.clone()),
        }
    }
}
