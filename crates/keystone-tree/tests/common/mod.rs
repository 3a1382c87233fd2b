#![allow(dead_code)]

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use keystone_tree::{Error, ModelType, NodeId, Patch, SimpleValue, Snapshot, Store, StoreConfig};
use serde_json::json;

// ── Fraction simple value ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Fraction {
    pub num: i64,
    pub den: i64,
}

impl SimpleValue for Fraction {
    fn type_name(&self) -> &str {
        "Fraction"
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot::from(json!([self.num, self.den]))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn register_fraction(store: &mut Store) {
    store.register_simple("Fraction", |data| {
        let parts = data.as_array().unwrap_or_default();
        match (parts.first().and_then(Snapshot::as_i64), parts.get(1).and_then(Snapshot::as_i64)) {
            (Some(num), Some(den)) => Ok(Box::new(Fraction { num, den }) as Box<dyn SimpleValue>),
            _ => Err(Error::InvalidSnapshot(format!("bad fraction data {data}"))),
        }
    });
}

// ── Todo models ───────────────────────────────────────────────────────────

pub fn todo_type() -> ModelType {
    ModelType::new("Todo")
        .on_init(|store, node| {
            if store.get(node, "done")?.is_none() {
                store.set(node, "done", false)?;
            }
            Ok(())
        })
        .action("setDone", |store, node, args| {
            let done = args.first().and_then(Snapshot::as_bool).unwrap_or(true);
            store.set(node, "done", done)?;
            Ok(Snapshot::null())
        })
        .action("setText", |store, node, args| {
            let text = args.first().and_then(Snapshot::as_str).unwrap_or_default().to_owned();
            store.set(node, "text", text)?;
            Ok(Snapshot::null())
        })
}

pub fn todo_list_type() -> ModelType {
    ModelType::new("TodoList")
        .action("add", |store, node, args| {
            let text = args.first().map(Snapshot::to_json).unwrap_or_default();
            let mut initial = json!({ "text": text });
            if let Some(id) = args.get(1).and_then(Snapshot::as_str) {
                initial["$modelId"] = json!(id);
            }
            let todo = store.create_model("Todo", initial)?;
            let items = child(store, node, "items");
            store.push(items, todo)?;
            Ok(Snapshot::null())
        })
        .action("toggleAll", |store, node, _| {
            let items = child(store, node, "items");
            for index in 0..store.len(items)? {
                let todo = child(store, items, &index.to_string());
                store.call_action(todo, "setDone", &[true.into()])?;
            }
            Ok(Snapshot::null())
        })
        .action("addThenFail", |store, node, args| {
            store.call_action(node, "add", args)?;
            Err(Error::action_failed("addThenFail", "rejected after write"))
        })
}

pub fn todo_store(config: StoreConfig) -> Store {
    let mut store = Store::new(config);
    store.register_model(todo_type());
    store.register_model(todo_list_type());
    store
}

pub fn todo_list(store: &mut Store) -> NodeId {
    store
        .tweak(json!({"$modelType": "TodoList", "$modelId": "list", "items": []}))
        .expect("todo list must build")
}

// ── Helpers ───────────────────────────────────────────────────────────────

/// Tracked child of `node` at `key`; panics when missing or a leaf.
pub fn child(store: &Store, node: NodeId, key: &str) -> NodeId {
    store
        .get(node, key)
        .ok()
        .flatten()
        .and_then(|slot| slot.as_node())
        .unwrap_or_else(|| panic!("no tracked child '{key}' under {node}"))
}

pub fn path(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

pub fn patch(value: serde_json::Value) -> Patch {
    serde_json::from_value(value).expect("patch json must decode")
}

/// Notifications received by one subtree patch listener.
#[derive(Clone, Default)]
pub struct PatchLog(Rc<RefCell<Vec<(Vec<Patch>, Vec<Patch>)>>>);

impl PatchLog {
    pub fn attach(store: &mut Store, root: NodeId) -> Self {
        let log = PatchLog::default();
        let sink = log.clone();
        store
            .on_patches(root, move |patches, inverse| {
                sink.0.borrow_mut().push((patches.to_vec(), inverse.to_vec()))
            })
            .expect("listener must register");
        log
    }

    pub fn notifications(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn patches(&self, index: usize) -> Vec<Patch> {
        self.0.borrow()[index].0.clone()
    }

    pub fn inverse(&self, index: usize) -> Vec<Patch> {
        self.0.borrow()[index].1.clone()
    }
}
