//! The store: process-scoped owner of every tracked node and registry.
//!
//! A [`Store`] is created once and passed by reference to whatever needs
//! the tree. It owns the node arena, the parent-link table, the snapshot
//! caches (inside the arena entries), the model/simple type tables, patch
//! and action listeners, and the scope counters that drive batching.

use std::collections::HashMap;

use rand::Rng;

use crate::action::ActionListeners;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::model::TypeRegistry;
use crate::node::{Node, NodeData, NodeId};
use crate::patch::emit::PatchListeners;
use crate::path::ParentLink;

/// Identifier returned by listener registration, used to dispose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

pub struct Store {
    pub(crate) config: StoreConfig,
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) parents: HashMap<NodeId, ParentLink>,
    pub(crate) registry: TypeRegistry,
    pub(crate) patch_listeners: PatchListeners,
    pub(crate) action_listeners: ActionListeners,
    /// Open batch scopes (actions and unprotected scopes).
    pub(crate) batch_depth: usize,
    /// Open action scopes; only depth 0 calls are recorded.
    pub(crate) action_depth: usize,
    pub(crate) unprotected_depth: usize,
    next_node: u64,
    next_listener: u64,
    model_ids: ModelIdGenerator,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        let model_ids = ModelIdGenerator::new(config.model_id_prefix.clone());
        Self {
            config,
            nodes: HashMap::new(),
            parents: HashMap::new(),
            registry: TypeRegistry::default(),
            patch_listeners: PatchListeners::default(),
            action_listeners: ActionListeners::default(),
            batch_depth: 0,
            action_depth: 0,
            unprotected_depth: 0,
            next_node: 1,
            next_listener: 1,
            model_ids,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of tracked nodes across all trees.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True while an action body is running.
    pub fn in_action(&self) -> bool {
        self.action_depth > 0
    }

    pub(crate) fn ensure(&self, node: NodeId) -> Result<()> {
        if self.nodes.contains_key(&node) {
            Ok(())
        } else {
            Err(Error::NodeNotFound(node))
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(Error::NodeNotFound(id))
    }

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, Node::new(data));
        id
    }

    pub(crate) fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    pub(crate) fn next_model_id(&mut self) -> String {
        self.model_ids.next_id()
    }

    /// Run `f` as one batch: patch notifications are delivered when the
    /// outermost scope closes.
    pub(crate) fn batch<R>(&mut self, f: impl FnOnce(&mut Store) -> Result<R>) -> Result<R> {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.flush_patches();
        }
        result
    }

    /// Run `f` with protection lifted, as a single unrecorded batch.
    pub fn run_unprotected<R>(&mut self, f: impl FnOnce(&mut Store) -> Result<R>) -> Result<R> {
        self.unprotected_depth += 1;
        let result = self.batch(f);
        self.unprotected_depth -= 1;
        result
    }

    /// Deregister a patch or action listener. Returns false if `id` was
    /// unknown or already disposed.
    pub fn dispose_listener(&mut self, id: ListenerId) -> bool {
        self.patch_listeners.dispose(id) || self.action_listeners.dispose(id)
    }

    pub(crate) fn check_protection(&self, node: NodeId) -> Result<()> {
        if self.config.protect_outside_actions
            && self.action_depth == 0
            && self.unprotected_depth == 0
        {
            return Err(Error::ProtectedMutation(node));
        }
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

// ── Model ids ─────────────────────────────────────────────────────────────

/// `<prefix>-<counter>` ids; the random prefix keeps ids from different
/// processes apart.
struct ModelIdGenerator {
    prefix: String,
    counter: u64,
}

impl ModelIdGenerator {
    fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix.unwrap_or_else(random_prefix),
            counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.counter);
        self.counter += 1;
        id
    }
}

fn random_prefix() -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut n: u64 = rand::thread_rng().gen();
    let mut out = Vec::with_capacity(13);
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
