//! Tweaking: turning payloads into tracked nodes, plus the accessor API.
//!
//! Every write to a tracked container goes through `Store::commit`, which
//! performs the structural change, updates parent links, invalidates cached
//! snapshots up the ancestor chain and emits the patch pair before
//! returning. The public setters below are thin wrappers around it.

use indexmap::IndexMap;

use crate::constants::{MODEL_ID_KEY, MODEL_TYPE_KEY};
use crate::error::{Error, Result};
use crate::model::SimpleValue;
use crate::node::{NodeData, NodeId, NodeKind, Slot};
use crate::patch::Patch;
use crate::snapshot::{Snapshot, SnapshotKind};
use crate::store::Store;

// ── Payload ───────────────────────────────────────────────────────────────

/// Anything that can be written into a tracked container.
#[derive(Debug)]
pub enum Payload {
    /// Plain data; containers inside it become new tracked nodes.
    Snapshot(Snapshot),
    /// An already tracked node. It is moved if it has a parent.
    Node(NodeId),
    /// An opaque simple value.
    Simple(Box<dyn SimpleValue>),
}

impl Payload {
    pub fn simple(value: impl SimpleValue + 'static) -> Self {
        Payload::Simple(Box::new(value))
    }
}

impl From<Snapshot> for Payload {
    fn from(s: Snapshot) -> Self {
        Payload::Snapshot(s)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Snapshot(Snapshot::from_json(&v))
    }
}

impl From<NodeId> for Payload {
    fn from(id: NodeId) -> Self {
        Payload::Node(id)
    }
}

impl From<Box<dyn SimpleValue>> for Payload {
    fn from(value: Box<dyn SimpleValue>) -> Self {
        Payload::Simple(value)
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Snapshot(b.into())
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Snapshot(n.into())
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Payload::Snapshot(n.into())
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Snapshot(s.into())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Snapshot(s.into())
    }
}

/// Elementary change accepted by the mutation funnel.
#[derive(Debug)]
pub(crate) enum Mutation {
    /// Upsert an object entry, or overwrite an existing array element.
    Set { key: String, value: Payload },
    /// Remove an object entry or an array element.
    Delete { key: String },
    /// Insert into an array (`index == len` appends).
    Insert { index: usize, value: Payload },
}

// ── Tweaking ──────────────────────────────────────────────────────────────

impl Store {
    /// Track `payload` as a new root and return its node.
    ///
    /// Passing an attached node detaches it from its parent instead.
    pub fn tweak(&mut self, payload: impl Into<Payload>) -> Result<NodeId> {
        match self.tweak_payload(payload.into(), None)? {
            Slot::Node(id) => Ok(id),
            Slot::Leaf(leaf) => Err(Error::InvalidSnapshot(format!(
                "leaf value {leaf} cannot be a tracked node"
            ))),
        }
    }

    /// Construct a model of a registered type from initial data and run its
    /// on-init hook as an action.
    pub fn create_model(
        &mut self,
        type_name: &str,
        initial: impl Into<Snapshot>,
    ) -> Result<NodeId> {
        let initial = initial.into();
        let entries = match initial.kind() {
            SnapshotKind::Object(entries) => entries.clone(),
            SnapshotKind::Null => IndexMap::new(),
            _ => {
                return Err(Error::InvalidSnapshot(format!(
                    "initial data of model '{type_name}' must be an object"
                )))
            }
        };
        self.construct_model(type_name, &Snapshot::object(entries), false)
    }

    pub(crate) fn tweak_payload(
        &mut self,
        payload: Payload,
        parent: Option<NodeId>,
    ) -> Result<Slot> {
        match payload {
            Payload::Snapshot(snapshot) => self.tweak_snapshot(&snapshot),
            Payload::Simple(value) => Ok(Slot::Node(self.tweak_simple(value))),
            Payload::Node(node) => {
                self.ensure(node)?;
                if let Some(parent) = parent {
                    if node == parent || self.is_ancestor(node, parent) {
                        return Err(Error::InvalidReparent { node, parent });
                    }
                }
                if let Some(link) = self.parents.get(&node).cloned() {
                    self.commit(link.parent, Mutation::Delete { key: link.key })?;
                }
                Ok(Slot::Node(node))
            }
        }
    }

    pub(crate) fn tweak_snapshot(&mut self, snapshot: &Snapshot) -> Result<Slot> {
        match snapshot.kind() {
            SnapshotKind::Null
            | SnapshotKind::Bool(_)
            | SnapshotKind::Number(_)
            | SnapshotKind::String(_) => Ok(Slot::Leaf(snapshot.clone())),
            SnapshotKind::Simple { type_name, data } => {
                let import = self.registry.simple(type_name)?;
                let value = import(data)?;
                Ok(Slot::Node(self.tweak_simple(value)))
            }
            SnapshotKind::Array(items) => {
                let id = self.alloc(NodeData::Array(Vec::with_capacity(items.len())));
                for (index, item) in items.iter().enumerate() {
                    let slot = self.tweak_snapshot(item)?;
                    if let Slot::Node(child) = slot {
                        self.link(child, id, index.to_string())?;
                    }
                    if let NodeData::Array(slots) = &mut self.node_mut(id)?.data {
                        slots.push(slot);
                    }
                }
                Ok(Slot::Node(id))
            }
            SnapshotKind::Object(entries) => match snapshot.model_type() {
                Some(type_name) => self.construct_model(type_name, snapshot, true).map(Slot::Node),
                None => self.tweak_object(entries).map(Slot::Node),
            },
        }
    }

    fn tweak_object(&mut self, entries: &IndexMap<String, Snapshot>) -> Result<NodeId> {
        let id = self.alloc(NodeData::Object(IndexMap::with_capacity(entries.len())));
        for (key, value) in entries {
            let slot = self.tweak_snapshot(value)?;
            if let Slot::Node(child) = slot {
                self.link(child, id, key.clone())?;
            }
            if let NodeData::Object(map) = &mut self.node_mut(id)?.data {
                map.insert(key.clone(), slot);
            }
        }
        Ok(id)
    }

    /// Simple values are exported once, here; the result seeds the cache
    /// for good since the holder is immutable.
    fn tweak_simple(&mut self, value: Box<dyn SimpleValue>) -> NodeId {
        let snapshot = Snapshot::simple(value.type_name(), value.to_snapshot());
        let id = self.alloc(NodeData::Simple(value));
        if let Some(node) = self.nodes.get(&id) {
            node.snapshot.replace(Some(snapshot));
        }
        id
    }

    fn construct_model(
        &mut self,
        type_name: &str,
        snapshot: &Snapshot,
        process: bool,
    ) -> Result<NodeId> {
        let model_type = self.registry.model(type_name)?;
        let input = match model_type.processor() {
            Some(processor) if process => processor(snapshot.clone())?,
            _ => snapshot.clone(),
        };
        let Some(fields) = input.as_object() else {
            return Err(Error::InvalidSnapshot(format!(
                "snapshot of model '{type_name}' must be an object"
            )));
        };
        let model_id = match input.model_id().or_else(|| snapshot.model_id()) {
            Some(id) => id.to_owned(),
            None => self.next_model_id(),
        };

        let mut entries = IndexMap::with_capacity(fields.len() + 2);
        entries.insert(MODEL_TYPE_KEY.to_owned(), Snapshot::from(type_name));
        entries.insert(MODEL_ID_KEY.to_owned(), Snapshot::from(model_id));
        for (key, value) in fields {
            if key != MODEL_TYPE_KEY && key != MODEL_ID_KEY {
                entries.insert(key.clone(), value.clone());
            }
        }

        let id = self.tweak_object(&entries)?;
        tracing::debug!(model_type = type_name, node = %id, "model constructed");
        if let Some(on_init) = model_type.on_init_action() {
            on_init(self, id, &[])?;
        }
        Ok(id)
    }
}

// ── Reads ─────────────────────────────────────────────────────────────────

impl Store {
    pub fn kind(&self, node: NodeId) -> Result<NodeKind> {
        Ok(self.node(node)?.data.kind())
    }

    /// Entry of an object, or element of an array when `key` is an index.
    pub fn get(&self, node: NodeId, key: &str) -> Result<Option<Slot>> {
        match &self.node(node)?.data {
            NodeData::Object(map) => Ok(map.get(key).cloned()),
            NodeData::Array(items) => Ok(key
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .cloned()),
            NodeData::Simple(_) => Err(Error::NotAContainer(node)),
        }
    }

    pub fn get_index(&self, node: NodeId, index: usize) -> Result<Option<Slot>> {
        self.get(node, &index.to_string())
    }

    pub fn len(&self, node: NodeId) -> Result<usize> {
        match &self.node(node)?.data {
            NodeData::Object(map) => Ok(map.len()),
            NodeData::Array(items) => Ok(items.len()),
            NodeData::Simple(_) => Err(Error::NotAContainer(node)),
        }
    }

    /// Object keys in insertion order, or array indices.
    pub fn keys(&self, node: NodeId) -> Result<Vec<String>> {
        match &self.node(node)?.data {
            NodeData::Object(map) => Ok(map.keys().cloned().collect()),
            NodeData::Array(items) => Ok((0..items.len()).map(|i| i.to_string()).collect()),
            NodeData::Simple(_) => Err(Error::NotAContainer(node)),
        }
    }

    /// The simple value held by `node`, if it is a `T`.
    pub fn simple<T: 'static>(&self, node: NodeId) -> Result<Option<&T>> {
        match &self.node(node)?.data {
            NodeData::Simple(value) => Ok(value.as_any().downcast_ref::<T>()),
            _ => Ok(None),
        }
    }

    pub fn model_type_of(&self, node: NodeId) -> Option<String> {
        self.meta_string(node, MODEL_TYPE_KEY)
    }

    pub fn model_id_of(&self, node: NodeId) -> Option<String> {
        self.meta_string(node, MODEL_ID_KEY)
    }

    fn meta_string(&self, node: NodeId, key: &str) -> Option<String> {
        match &self.nodes.get(&node)?.data {
            NodeData::Object(map) => map.get(key)?.as_leaf()?.as_str().map(str::to_owned),
            _ => None,
        }
    }
}

// ── Writes ────────────────────────────────────────────────────────────────

impl Store {
    /// Upsert an object entry (or overwrite an array element by index key).
    pub fn set(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<Payload>,
    ) -> Result<()> {
        let key = key.into();
        self.commit(node, Mutation::Set { key, value: value.into() })
            .map(|_| ())
    }

    /// Remove an entry. Returns false if the object had no such key.
    pub fn delete(&mut self, node: NodeId, key: &str) -> Result<bool> {
        self.commit(node, Mutation::Delete { key: key.to_owned() })
    }

    pub fn set_index(
        &mut self,
        node: NodeId,
        index: usize,
        value: impl Into<Payload>,
    ) -> Result<()> {
        self.set(node, index.to_string(), value)
    }

    pub fn insert(&mut self, node: NodeId, index: usize, value: impl Into<Payload>) -> Result<()> {
        self.commit(node, Mutation::Insert { index, value: value.into() })
            .map(|_| ())
    }

    pub fn push(&mut self, node: NodeId, value: impl Into<Payload>) -> Result<()> {
        let index = self.len(node)?;
        self.insert(node, index, value)
    }

    pub fn remove_index(&mut self, node: NodeId, index: usize) -> Result<()> {
        self.commit(node, Mutation::Delete { key: index.to_string() })
            .map(|_| ())
    }

    /// Remove `node` from its parent container; it becomes a root.
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        self.ensure(node)?;
        if let Some(link) = self.parents.get(&node).cloned() {
            self.commit(link.parent, Mutation::Delete { key: link.key })?;
        }
        Ok(())
    }

    /// Detach `node` and drop its whole subtree from the store. Returns the
    /// number of nodes dropped.
    pub fn discard(&mut self, node: NodeId) -> Result<usize> {
        self.detach(node)?;
        let mut stack = vec![node];
        let mut dropped = 0;
        while let Some(id) = stack.pop() {
            if let Some(entry) = self.nodes.remove(&id) {
                stack.extend(entry.data.child_nodes());
                self.parents.remove(&id);
                self.patch_listeners.drop_subtree_root(id);
                self.action_listeners.drop_subtree_root(id);
                dropped += 1;
            }
        }
        Ok(dropped)
    }

    /// Drop every detached tree whose root is not listed in `keep`.
    pub fn collect_garbage(&mut self, keep: &[NodeId]) -> usize {
        let roots: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|id| !self.parents.contains_key(*id) && !keep.contains(*id))
            .copied()
            .collect();
        let mut dropped = 0;
        for root in roots {
            match self.discard(root) {
                Ok(count) => dropped += count,
                Err(err) => {
                    tracing::warn!(error = %err, node = %root, "discarding detached tree failed")
                }
            }
        }
        tracing::debug!(dropped, "garbage collected");
        dropped
    }
}

// ── Mutation funnel ───────────────────────────────────────────────────────

impl Store {
    /// Apply one elementary mutation. Returns false when it was a no-op.
    pub(crate) fn commit(&mut self, node: NodeId, mutation: Mutation) -> Result<bool> {
        self.check_protection(node)?;
        match (self.kind(node)?, mutation) {
            (NodeKind::Simple, _) => Err(Error::NotAContainer(node)),
            (NodeKind::Object, Mutation::Set { key, value }) => self.object_set(node, key, value),
            (NodeKind::Object, Mutation::Delete { key }) => self.object_delete(node, key),
            (NodeKind::Object, Mutation::Insert { index, .. }) => Err(Error::InvalidKey {
                node,
                key: index.to_string(),
            }),
            (NodeKind::Array, Mutation::Set { key, value }) => {
                let index = self.array_index(node, &key, false)?;
                if self.is_noop_write(node, &key, &value)? {
                    return Ok(false);
                }
                let index = self.move_target(node, index, &value, false)?;
                self.array_replace(node, index, value)
            }
            (NodeKind::Array, Mutation::Delete { key }) => {
                let index = self.array_index(node, &key, false)?;
                self.array_remove(node, index)
            }
            (NodeKind::Array, Mutation::Insert { index, value }) => {
                self.array_index(node, &index.to_string(), true)?;
                let index = self.move_target(node, index, &value, true)?;
                self.array_insert(node, index, value)
            }
        }
    }

    fn array_index(&self, node: NodeId, key: &str, allow_end: bool) -> Result<usize> {
        let len = self.len(node)?;
        match key.parse::<usize>() {
            Ok(index) if index < len || (allow_end && index == len) => Ok(index),
            _ => Err(Error::InvalidKey {
                node,
                key: key.to_owned(),
            }),
        }
    }

    /// Where an array write lands once a node moving within the same array
    /// has left its old slot. Checked before anything is detached.
    fn move_target(
        &self,
        node: NodeId,
        index: usize,
        value: &Payload,
        allow_end: bool,
    ) -> Result<usize> {
        let mut len = self.len(node)?;
        let mut target = index;
        if let Payload::Node(moved) = value {
            if let Some(link) = self.parents.get(moved).filter(|link| link.parent == node) {
                len = len.saturating_sub(1);
                if link.key.parse::<usize>().is_ok_and(|from| from < index) {
                    target -= 1;
                }
            }
        }
        if target < len || (allow_end && target == len) {
            Ok(target)
        } else {
            Err(Error::InvalidKey {
                node,
                key: index.to_string(),
            })
        }
    }

    fn is_noop_write(&self, node: NodeId, key: &str, value: &Payload) -> Result<bool> {
        let Some(current) = self.get(node, key)? else {
            return Ok(false);
        };
        Ok(match (&current, value) {
            (Slot::Node(a), Payload::Node(b)) => a == b,
            (Slot::Leaf(a), Payload::Snapshot(b)) => a == b,
            _ => false,
        })
    }

    fn object_set(&mut self, node: NodeId, key: String, value: Payload) -> Result<bool> {
        if self.is_noop_write(node, &key, &value)? {
            return Ok(false);
        }
        let new_slot = self.tweak_payload(value, Some(node))?;
        let old_slot = self.get(node, &key)?;
        let old_snapshot = old_slot.as_ref().map(|s| self.slot_snapshot(s)).transpose()?;
        let new_snapshot = self.slot_snapshot(&new_slot)?;

        if let NodeData::Object(map) = &mut self.node_mut(node)?.data {
            map.insert(key.clone(), new_slot.clone());
        }
        if let Some(Slot::Node(old)) = old_slot {
            self.unlink(old);
        }
        if let Slot::Node(child) = new_slot {
            self.link(child, node, key.clone())?;
        }
        self.invalidate(node);

        let path = vec![key];
        let (patch, inverse) = match old_snapshot {
            Some(old) => (
                Patch::Replace { path: path.clone(), value: new_snapshot },
                Patch::Replace { path, value: old },
            ),
            None => (
                Patch::Add { path: path.clone(), value: new_snapshot },
                Patch::Remove { path },
            ),
        };
        self.emit_patch(node, patch, inverse);
        Ok(true)
    }

    fn object_delete(&mut self, node: NodeId, key: String) -> Result<bool> {
        let Some(old_slot) = self.get(node, &key)? else {
            return Ok(false);
        };
        let old_snapshot = self.slot_snapshot(&old_slot)?;
        if let NodeData::Object(map) = &mut self.node_mut(node)?.data {
            map.shift_remove(&key);
        }
        if let Slot::Node(old) = old_slot {
            self.unlink(old);
        }
        self.invalidate(node);

        let path = vec![key];
        self.emit_patch(
            node,
            Patch::Remove { path: path.clone() },
            Patch::Add { path, value: old_snapshot },
        );
        Ok(true)
    }

    fn array_replace(&mut self, node: NodeId, index: usize, value: Payload) -> Result<bool> {
        let new_slot = self.tweak_payload(value, Some(node))?;
        let key = index.to_string();
        let old_slot = self.get_index(node, index)?;
        let old_snapshot = old_slot.as_ref().map(|s| self.slot_snapshot(s)).transpose()?;
        let new_snapshot = self.slot_snapshot(&new_slot)?;

        if let NodeData::Array(items) = &mut self.node_mut(node)?.data {
            if let Some(item) = items.get_mut(index) {
                *item = new_slot.clone();
            }
        }
        if let Some(Slot::Node(old)) = old_slot {
            self.unlink(old);
        }
        if let Slot::Node(child) = new_slot {
            self.link(child, node, key.clone())?;
        }
        self.invalidate(node);

        let path = vec![key];
        let old = old_snapshot.unwrap_or_else(Snapshot::null);
        self.emit_patch(
            node,
            Patch::Replace { path: path.clone(), value: new_snapshot },
            Patch::Replace { path, value: old },
        );
        Ok(true)
    }

    fn array_insert(&mut self, node: NodeId, index: usize, value: Payload) -> Result<bool> {
        let new_slot = self.tweak_payload(value, Some(node))?;
        let key = index.to_string();
        let new_snapshot = self.slot_snapshot(&new_slot)?;

        if let NodeData::Array(items) = &mut self.node_mut(node)?.data {
            items.insert(index, new_slot.clone());
        }
        if let Slot::Node(child) = new_slot {
            self.link(child, node, key.clone())?;
        }
        self.rekey_array_links(node, index + 1);
        self.invalidate(node);

        let path = vec![key];
        self.emit_patch(
            node,
            Patch::Add { path: path.clone(), value: new_snapshot },
            Patch::Remove { path },
        );
        Ok(true)
    }

    fn array_remove(&mut self, node: NodeId, index: usize) -> Result<bool> {
        let Some(old_slot) = self.get_index(node, index)? else {
            return Ok(false);
        };
        let old_snapshot = self.slot_snapshot(&old_slot)?;
        if let NodeData::Array(items) = &mut self.node_mut(node)?.data {
            items.remove(index);
        }
        if let Slot::Node(old) = old_slot {
            self.unlink(old);
        }
        self.rekey_array_links(node, index);
        self.invalidate(node);

        let path = vec![index.to_string()];
        self.emit_patch(
            node,
            Patch::Remove { path: path.clone() },
            Patch::Add { path, value: old_snapshot },
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn nested_containers_become_nodes() {
        let mut store = Store::default();
        let root = store.tweak(json!({"a": [1, {"b": true}], "s": "x"})).unwrap();
        assert_eq!(store.kind(root).unwrap(), NodeKind::Object);
        let a = store.get(root, "a").unwrap().unwrap().as_node().unwrap();
        assert_eq!(store.kind(a).unwrap(), NodeKind::Array);
        assert_eq!(store.len(a).unwrap(), 2);
        assert_eq!(store.get_index(a, 0).unwrap(), Some(Slot::Leaf(Snapshot::from(1i64))));
        assert_eq!(store.keys(root).unwrap(), vec!["a", "s"]);
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn tweaking_a_leaf_fails() {
        let mut store = Store::default();
        let err = store.tweak(json!(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSnapshot);
    }

    #[test]
    fn moving_a_node_removes_it_from_the_old_parent() {
        let mut store = Store::default();
        let root = store.tweak(json!({"a": {"v": 1}, "list": []})).unwrap();
        let a = store.get(root, "a").unwrap().unwrap().as_node().unwrap();
        let list = store.get(root, "list").unwrap().unwrap().as_node().unwrap();

        store.push(list, a).unwrap();
        assert_eq!(store.get(root, "a").unwrap(), None);
        assert_eq!(store.path_of(a), vec!["list", "0"]);
        assert_eq!(store.get_snapshot(root).unwrap(), json!({"list": [{"v": 1}]}));
    }

    fn recorded(store: &mut Store, root: NodeId) -> Rc<RefCell<Vec<Patch>>> {
        let seen: Rc<RefCell<Vec<Patch>>> = Rc::default();
        let sink = seen.clone();
        store
            .on_patches(root, move |patches, _| sink.borrow_mut().extend_from_slice(patches))
            .unwrap();
        seen
    }

    #[test]
    fn moving_within_the_same_array() {
        let mut store = Store::default();
        let root = store.tweak(json!({"list": [{"v": 0}, {"v": 1}]})).unwrap();
        let list = store.get(root, "list").unwrap().unwrap().as_node().unwrap();
        let first = store.get_index(list, 0).unwrap().unwrap().as_node().unwrap();
        let second = store.get_index(list, 1).unwrap().unwrap().as_node().unwrap();
        let seen = recorded(&mut store, root);

        store.push(list, first).unwrap();
        assert_eq!(store.get_snapshot(root).unwrap(), json!({"list": [{"v": 1}, {"v": 0}]}));
        assert_eq!(store.path_of(first), vec!["list", "1"]);
        assert_eq!(store.path_of(second), vec!["list", "0"]);
        assert_eq!(
            serde_json::to_value(&*seen.borrow()).unwrap(),
            json!([
                {"op": "remove", "path": ["list", "0"]},
                {"op": "add", "path": ["list", "1"], "value": {"v": 0}},
            ])
        );

        store.insert(list, 0, first).unwrap();
        assert_eq!(store.get_snapshot(root).unwrap(), json!({"list": [{"v": 0}, {"v": 1}]}));
        assert_eq!(store.path_of(first), vec!["list", "0"]);
    }

    #[test]
    fn replacing_with_a_sibling_from_the_same_array() {
        let mut store = Store::default();
        let root = store.tweak(json!({"list": [{"v": 0}, {"v": 1}]})).unwrap();
        let list = store.get(root, "list").unwrap().unwrap().as_node().unwrap();
        let first = store.get_index(list, 0).unwrap().unwrap().as_node().unwrap();
        let second = store.get_index(list, 1).unwrap().unwrap().as_node().unwrap();
        let seen = recorded(&mut store, root);

        store.set_index(list, 1, first).unwrap();
        assert_eq!(store.get_snapshot(root).unwrap(), json!({"list": [{"v": 0}]}));
        assert_eq!(store.path_of(first), vec!["list", "0"]);
        assert!(store.is_root(second));
        assert_eq!(
            serde_json::to_value(&*seen.borrow()).unwrap(),
            json!([
                {"op": "remove", "path": ["list", "0"]},
                {"op": "replace", "path": ["list", "0"], "value": {"v": 0}},
            ])
        );
    }

    #[test]
    fn failed_move_leaves_the_tree_untouched() {
        let mut store = Store::default();
        let root = store.tweak(json!({"list": [{"v": 0}, {"v": 1}], "o": {}})).unwrap();
        let list = store.get(root, "list").unwrap().unwrap().as_node().unwrap();
        let first = store.get_index(list, 0).unwrap().unwrap().as_node().unwrap();
        let seen = recorded(&mut store, root);

        assert_eq!(store.set_index(list, 2, first).unwrap_err().kind(), ErrorKind::InvalidKey);
        assert_eq!(store.insert(list, 3, first).unwrap_err().kind(), ErrorKind::InvalidKey);
        assert_eq!(store.set(first, "x", list).unwrap_err().kind(), ErrorKind::InvalidReparent);
        let err = store.set_index(list, 1, list).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReparent);
        assert_eq!(
            store.get_snapshot(root).unwrap(),
            json!({"list": [{"v": 0}, {"v": 1}], "o": {}})
        );
        assert_eq!(store.path_of(first), vec!["list", "0"]);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut store = Store::default();
        let root = store.tweak(json!({"a": {"b": {}}})).unwrap();
        let a = store.get(root, "a").unwrap().unwrap().as_node().unwrap();
        let b = store.get(a, "b").unwrap().unwrap().as_node().unwrap();
        let err = store.set(b, "loop", a).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReparent);
        assert_eq!(store.path_of(a), vec!["a"]);
    }

    #[test]
    fn same_value_writes_are_noops() {
        let mut store = Store::default();
        let root = store.tweak(json!({"x": 1, "o": {}})).unwrap();
        let o = store.get(root, "o").unwrap().unwrap().as_node().unwrap();
        let same_leaf = Mutation::Set { key: "x".into(), value: json!(1).into() };
        assert!(!store.commit(root, same_leaf).unwrap());
        assert!(!store.commit(root, Mutation::Set { key: "o".into(), value: o.into() }).unwrap());
        assert!(!store.delete(root, "missing").unwrap());
    }

    #[test]
    fn array_bounds_are_checked() {
        let mut store = Store::default();
        let arr = store.tweak(json!([1, 2])).unwrap();
        assert_eq!(store.set_index(arr, 2, json!(0)).unwrap_err().kind(), ErrorKind::InvalidKey);
        assert_eq!(store.insert(arr, 3, json!(0)).unwrap_err().kind(), ErrorKind::InvalidKey);
        assert_eq!(store.remove_index(arr, 5).unwrap_err().kind(), ErrorKind::InvalidKey);
        store.insert(arr, 2, json!(3)).unwrap();
        assert_eq!(store.get_snapshot(arr).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn detach_and_discard() {
        let mut store = Store::default();
        let root = store.tweak(json!({"a": {"b": [1]}})).unwrap();
        let a = store.get(root, "a").unwrap().unwrap().as_node().unwrap();

        store.detach(a).unwrap();
        assert!(store.is_root(a));
        assert_eq!(store.get_snapshot(a).unwrap(), json!({"b": [1]}));
        assert_eq!(store.get_snapshot(root).unwrap(), json!({}));

        assert_eq!(store.collect_garbage(&[root]), 2);
        assert!(!store.contains(a));
        assert_eq!(store.get_snapshot(a).unwrap_err().kind(), ErrorKind::NodeNotFound);
        assert_eq!(store.discard(root).unwrap(), 1);
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn protected_store_rejects_bare_writes() {
        let mut store = Store::new(crate::StoreConfig {
            protect_outside_actions: true,
            ..Default::default()
        });
        let root = store.tweak(json!({"x": 1})).unwrap();
        let err = store.set(root, "x", json!(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtectedMutation);
        store.run_unprotected(|s| s.set(root, "x", json!(2))).unwrap();
        assert_eq!(store.get_snapshot(root).unwrap(), json!({"x": 2}));
    }
}
