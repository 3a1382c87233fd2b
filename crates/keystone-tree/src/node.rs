//! Tracked node storage: identities, container payloads and slots.

use std::cell::RefCell;
use std::fmt;

use indexmap::IndexMap;

use crate::model::SimpleValue;
use crate::snapshot::Snapshot;

/// Stable identity of a tracked node inside a [`Store`](crate::Store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Content of one container position: an immutable leaf or a tracked child.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Leaf(Snapshot),
    Node(NodeId),
}

impl Slot {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Slot::Node(id) => Some(*id),
            Slot::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Snapshot> {
        match self {
            Slot::Leaf(s) => Some(s),
            Slot::Node(_) => None,
        }
    }
}

/// Kind of payload a tracked node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Keyed mapping (insertion ordered).
    Object,
    /// Ordered sequence.
    Array,
    /// Opaque immutable value holder.
    Simple,
}

pub(crate) enum NodeData {
    Object(IndexMap<String, Slot>),
    Array(Vec<Slot>),
    Simple(Box<dyn SimpleValue>),
}

impl NodeData {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            NodeData::Object(_) => NodeKind::Object,
            NodeData::Array(_) => NodeKind::Array,
            NodeData::Simple(_) => NodeKind::Simple,
        }
    }

    /// Tracked children, in container order.
    pub(crate) fn child_nodes(&self) -> Vec<NodeId> {
        match self {
            NodeData::Object(map) => map.values().filter_map(Slot::as_node).collect(),
            NodeData::Array(items) => items.iter().filter_map(Slot::as_node).collect(),
            NodeData::Simple(_) => Vec::new(),
        }
    }
}

/// Arena entry. The cached snapshot is `None` while stale.
pub(crate) struct Node {
    pub(crate) data: NodeData,
    pub(crate) snapshot: RefCell<Option<Snapshot>>,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            data,
            snapshot: RefCell::new(None),
        }
    }
}
