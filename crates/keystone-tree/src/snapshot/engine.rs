//! Snapshot computation for live nodes.
//!
//! Each arena entry caches its last snapshot. A mutation clears the cache of
//! the mutated container and of every ancestor, so an unchanged subtree keeps
//! handing out the very same `Arc` and a rebuild only revisits stale paths.

use indexmap::IndexMap;

use crate::error::Result;
use crate::node::{NodeData, NodeId, Slot};
use crate::snapshot::Snapshot;
use crate::store::Store;

impl Store {
    /// Immutable snapshot of `node`.
    pub fn get_snapshot(&self, node: NodeId) -> Result<Snapshot> {
        let entry = self.node(node)?;
        if let Some(cached) = entry.snapshot.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let snapshot = match &entry.data {
            NodeData::Object(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, slot) in map {
                    out.insert(key.clone(), self.slot_snapshot(slot)?);
                }
                Snapshot::object(out)
            }
            NodeData::Array(items) => Snapshot::array(
                items
                    .iter()
                    .map(|slot| self.slot_snapshot(slot))
                    .collect::<Result<Vec<_>>>()?,
            ),
            NodeData::Simple(value) => Snapshot::simple(value.type_name(), value.to_snapshot()),
        };
        entry.snapshot.replace(Some(snapshot.clone()));
        Ok(snapshot)
    }

    pub fn slot_snapshot(&self, slot: &Slot) -> Result<Snapshot> {
        match slot {
            Slot::Leaf(leaf) => Ok(leaf.clone()),
            Slot::Node(id) => self.get_snapshot(*id),
        }
    }

    /// Clear the cached snapshot of `node` and all of its ancestors.
    pub(crate) fn invalidate(&self, node: NodeId) {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(entry) = self.nodes.get(&id) {
                entry.snapshot.replace(None);
            }
            current = self.parent_of(id);
        }
    }

    /// Build live data from a snapshot. Scalars come back as leaves;
    /// containers, simple values and models become a new detached root.
    pub fn from_snapshot(&mut self, snapshot: &Snapshot) -> Result<Slot> {
        let slot = self.tweak_snapshot(snapshot)?;
        if let Slot::Node(id) = slot {
            tracing::debug!(node = %id, "tree built from snapshot");
        }
        Ok(slot)
    }
}
