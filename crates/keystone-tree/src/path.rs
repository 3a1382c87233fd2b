//! Parent tracking: the parent-link table and root-to-node paths.
//!
//! Links live in a table keyed by child id rather than inside the nodes, so
//! detaching a subtree never touches its payload. Array children are keyed
//! by their index as a string and are re-keyed whenever the array shifts.

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::store::Store;

/// Key sequence from a subtree root down to a node. Array indices are
/// numeric strings.
pub type Path = Vec<String>;

/// Directed child → parent edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParentLink {
    pub(crate) parent: NodeId,
    pub(crate) key: String,
}

/// Format a path as a JSON Pointer (RFC 6901) for messages.
pub fn format_path(path: &[String]) -> String {
    let mut out = String::new();
    for key in path {
        out.push('/');
        out.push_str(&key.replace('~', "~0").replace('/', "~1"));
    }
    out
}

impl Store {
    /// Install or replace the parent link of `node`.
    pub(crate) fn link(&mut self, node: NodeId, parent: NodeId, key: String) -> Result<()> {
        self.ensure(node)?;
        self.ensure(parent)?;
        if node == parent || self.is_ancestor(node, parent) {
            return Err(Error::InvalidReparent { node, parent });
        }
        self.parents.insert(node, ParentLink { parent, key });
        Ok(())
    }

    /// Remove the parent link of `node`, making it a root.
    pub(crate) fn unlink(&mut self, node: NodeId) -> Option<ParentLink> {
        self.parents.remove(&node)
    }

    /// Rewrite the link keys of array elements from `from` onwards.
    pub(crate) fn rekey_array_links(&mut self, array: NodeId, from: usize) {
        let Some(node) = self.nodes.get(&array) else { return };
        if let crate::node::NodeData::Array(items) = &node.data {
            for (index, slot) in items.iter().enumerate().skip(from) {
                if let Some(child) = slot.as_node() {
                    if let Some(link) = self.parents.get_mut(&child) {
                        link.key = index.to_string();
                    }
                }
            }
        }
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(&node).map(|link| link.parent)
    }

    /// Key of `node` inside its parent.
    pub fn parent_key_of(&self, node: NodeId) -> Option<&str> {
        self.parents.get(&node).map(|link| link.key.as_str())
    }

    pub fn is_root(&self, node: NodeId) -> bool {
        !self.parents.contains_key(&node)
    }

    /// Walk parent links to the top. A detached node is its own root.
    pub fn root_of(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(link) = self.parents.get(&current) {
            current = link.parent;
        }
        current
    }

    /// Returns true if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while let Some(link) = self.parents.get(&current) {
            if link.parent == ancestor {
                return true;
            }
            current = link.parent;
        }
        false
    }

    /// Path from the root of `node`'s tree down to `node`.
    pub fn path_of(&self, node: NodeId) -> Path {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(link) = self.parents.get(&current) {
            path.push(link.key.clone());
            current = link.parent;
        }
        path.reverse();
        path
    }

    /// Path from `subtree_root` down to `node`, or `None` when `node` is not
    /// in that subtree.
    pub fn path_from(&self, subtree_root: NodeId, node: NodeId) -> Option<Path> {
        let mut path = Vec::new();
        let mut current = node;
        while current != subtree_root {
            let link = self.parents.get(&current)?;
            path.push(link.key.clone());
            current = link.parent;
        }
        path.reverse();
        Some(path)
    }

    /// Follow `path` down from `root`; every step must reach a tracked node.
    pub fn resolve_path(&self, root: NodeId, path: &[String]) -> Option<NodeId> {
        let mut current = root;
        for key in path {
            current = self.get(current, key).ok()??.as_node()?;
        }
        self.nodes.contains_key(&current).then_some(current)
    }
}
