//! Error types for store operations.

use thiserror::Error;

use crate::node::NodeId;
use crate::path::{format_path, Path};

/// Result type alias for store operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised synchronously by tree, patch and action operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The node id is unknown to the store (never created, or discarded).
    #[error("node {0} is not tracked by this store")]
    NodeNotFound(NodeId),

    /// Attaching `node` under `parent` would turn the tree into a cycle.
    #[error("cannot attach node {node} under {parent}: the new parent is a descendant of the node")]
    InvalidReparent { node: NodeId, parent: NodeId },

    /// A patch references a path that does not exist in the target tree.
    #[error("patch path not found: '{}'", format_path(.path))]
    PatchPathNotFound { path: Path },

    /// An action call's target path does not resolve to a node.
    #[error("action target not found: '{}'", format_path(.path))]
    ActionTargetNotFound { path: Path },

    /// The resolved action target has no action with the given name.
    #[error("action '{name}' not found on target '{}'", format_path(.path))]
    ActionMethodNotFound { path: Path, name: String },

    #[error("unknown model type '{0}'")]
    UnknownModelType(String),

    #[error("unknown simple type '{0}'")]
    UnknownSimpleType(String),

    /// The key is not valid for the container (missing index, bad index, ...).
    #[error("invalid key '{key}' for node {node}")]
    InvalidKey { node: NodeId, key: String },

    /// The node holds an opaque simple value and has no entries.
    #[error("node {0} is not a keyed or ordered container")]
    NotAContainer(NodeId),

    /// Mutation attempted outside an action while protection is enabled.
    #[error("node {0} can only be modified inside an action or an unprotected scope")]
    ProtectedMutation(NodeId),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Raised by an action body.
    #[error("action '{name}' failed: {message}")]
    ActionFailed { name: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fieldless discriminant of [`Error`], for matching on failure kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NodeNotFound,
    InvalidReparent,
    PatchPathNotFound,
    ActionTargetNotFound,
    ActionMethodNotFound,
    UnknownModelType,
    UnknownSimpleType,
    InvalidKey,
    NotAContainer,
    ProtectedMutation,
    InvalidSnapshot,
    ActionFailed,
    Serialization,
}

impl Error {
    /// Create an action failure error from inside an action body.
    pub fn action_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ActionFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NodeNotFound(_) => ErrorKind::NodeNotFound,
            Error::InvalidReparent { .. } => ErrorKind::InvalidReparent,
            Error::PatchPathNotFound { .. } => ErrorKind::PatchPathNotFound,
            Error::ActionTargetNotFound { .. } => ErrorKind::ActionTargetNotFound,
            Error::ActionMethodNotFound { .. } => ErrorKind::ActionMethodNotFound,
            Error::UnknownModelType(_) => ErrorKind::UnknownModelType,
            Error::UnknownSimpleType(_) => ErrorKind::UnknownSimpleType,
            Error::InvalidKey { .. } => ErrorKind::InvalidKey,
            Error::NotAContainer(_) => ErrorKind::NotAContainer,
            Error::ProtectedMutation(_) => ErrorKind::ProtectedMutation,
            Error::InvalidSnapshot(_) => ErrorKind::InvalidSnapshot,
            Error::ActionFailed { .. } => ErrorKind::ActionFailed,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_format_paths_as_pointers() {
        let err = Error::PatchPathNotFound {
            path: vec!["p2".to_string(), "a/b".to_string()],
        };
        assert_eq!(err.to_string(), "patch path not found: '/p2/a~1b'");
        assert_eq!(err.kind(), ErrorKind::PatchPathNotFound);
    }

    #[test]
    fn action_failed_helper() {
        let err = Error::action_failed("setDone", "boom");
        assert_eq!(err.kind(), ErrorKind::ActionFailed);
        assert_eq!(err.to_string(), "action 'setDone' failed: boom");
    }
}
