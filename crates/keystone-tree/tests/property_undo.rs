//! Property: any sequence of edits is undone by applying the inverse
//! patches of every notification, newest first, each list reversed.

mod common;

use common::PatchLog;
use keystone_tree::{NodeId, Slot, Store};
use proptest::prelude::*;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
enum Edit {
    SetKey(u8, i64),
    SetObject(u8),
    DeleteKey(u8),
    Push(i64),
    Insert(u8, i64),
    Remove(u8),
    Replace(u8, i64),
    PushObject(i64),
    MoveToList(u8, u8),
    MoveToObject(u8, u8),
    MoveWithin(u8, u8),
    ReplaceWithSibling(u8, u8),
    Batch(Vec<Edit>),
}

fn leaf_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0u8..4, any::<i64>()).prop_map(|(k, v)| Edit::SetKey(k, v)),
        (0u8..4).prop_map(Edit::SetObject),
        (0u8..4).prop_map(Edit::DeleteKey),
        any::<i64>().prop_map(Edit::Push),
        (0u8..8, any::<i64>()).prop_map(|(i, v)| Edit::Insert(i, v)),
        (0u8..8).prop_map(Edit::Remove),
        (0u8..8, any::<i64>()).prop_map(|(i, v)| Edit::Replace(i, v)),
        any::<i64>().prop_map(Edit::PushObject),
        (0u8..4, 0u8..8).prop_map(|(k, i)| Edit::MoveToList(k, i)),
        (0u8..8, 0u8..4).prop_map(|(i, k)| Edit::MoveToObject(i, k)),
        (0u8..8, 0u8..8).prop_map(|(from, to)| Edit::MoveWithin(from, to)),
        (0u8..8, 0u8..8).prop_map(|(from, to)| Edit::ReplaceWithSibling(from, to)),
    ]
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => leaf_edit(),
        1 => prop::collection::vec(leaf_edit(), 1..5).prop_map(Edit::Batch),
    ]
}

fn key(k: u8) -> String {
    format!("k{k}")
}

fn node(store: &Store, parent: NodeId, key: &str) -> NodeId {
    match store.get(parent, key) {
        Ok(Some(Slot::Node(id))) => id,
        other => panic!("expected a node at {key}, got {other:?}"),
    }
}

/// The tracked node under `key`, if that entry holds one.
fn node_at(store: &Store, parent: NodeId, key: &str) -> Option<NodeId> {
    match store.get(parent, key) {
        Ok(Some(Slot::Node(id))) => Some(id),
        _ => None,
    }
}

/// Apply one edit; edits that do not fit the current shape are skipped.
fn run(store: &mut Store, obj: NodeId, list: NodeId, edit: &Edit) {
    let len = store.len(list).expect("list must exist");
    let result = match edit {
        Edit::SetKey(k, v) => store.set(obj, key(*k), *v),
        Edit::SetObject(k) => store.set(obj, key(*k), json!({"nested": [*k]})),
        Edit::DeleteKey(k) => store.delete(obj, &key(*k)).map(|_| ()),
        Edit::Push(v) => store.push(list, *v),
        Edit::Insert(i, v) if (*i as usize) <= len => store.insert(list, *i as usize, *v),
        Edit::Remove(i) if (*i as usize) < len => store.remove_index(list, *i as usize),
        Edit::Replace(i, v) if (*i as usize) < len => store.set_index(list, *i as usize, *v),
        Edit::PushObject(v) => store.push(list, json!({"n": [*v]})),
        Edit::MoveToList(k, i) if (*i as usize) <= len => match node_at(store, obj, &key(*k)) {
            Some(moved) => store.insert(list, *i as usize, moved),
            None => Ok(()),
        },
        Edit::MoveToObject(i, k) => match node_at(store, list, &i.to_string()) {
            Some(moved) => store.set(obj, key(*k), moved),
            None => Ok(()),
        },
        Edit::MoveWithin(from, to) if (*to as usize) <= len => {
            match node_at(store, list, &from.to_string()) {
                Some(moved) => store.insert(list, *to as usize, moved),
                None => Ok(()),
            }
        }
        Edit::ReplaceWithSibling(from, to) if (*to as usize) < len => {
            match node_at(store, list, &from.to_string()) {
                Some(moved) => store.set_index(list, *to as usize, moved),
                None => Ok(()),
            }
        }
        Edit::Batch(edits) => store.run_unprotected(|s| {
            for e in edits {
                run(s, obj, list, e);
            }
            Ok(())
        }),
        _ => Ok(()),
    };
    result.expect("edit must apply");
}

proptest! {
    #[test]
    fn reversed_inverse_patches_restore_the_snapshot(
        initial in prop::collection::vec(any::<i64>(), 0..4),
        edits in prop::collection::vec(edit(), 1..20),
    ) {
        let mut store = Store::default();
        let root = store.tweak(json!({"obj": {"k0": 0}, "list": initial})).unwrap();
        let obj = node(&store, root, "obj");
        let list = node(&store, root, "list");
        let before: Value = store.get_snapshot(root).unwrap().to_json();
        let log = PatchLog::attach(&mut store, root);

        for e in &edits {
            run(&mut store, obj, list, e);
        }

        for index in (0..log.notifications()).rev() {
            store.apply_patches_reversed(root, &log.inverse(index)).unwrap();
        }
        prop_assert_eq!(store.get_snapshot(root).unwrap().to_json(), before);
    }
}
