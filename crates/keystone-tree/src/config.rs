//! Store configuration.

use serde::Deserialize;

/// Options for a [`Store`](crate::Store).
///
/// Deserializable so hosts can keep it next to the rest of their settings;
/// missing fields take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Deliver one patch notification per top-level action instead of one
    /// per elementary mutation.
    pub coalesce_action_patches: bool,
    /// Reject mutations performed outside an action or an unprotected scope.
    pub protect_outside_actions: bool,
    /// Prefix for generated model ids. A random tag is used when unset.
    pub model_id_prefix: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            coalesce_action_patches: true,
            protect_outside_actions: false,
            model_id_prefix: None,
        }
    }
}
