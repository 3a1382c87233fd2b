//! Reserved keys and names.

/// Key tagging an opaque simple-value snapshot: `{"$simple": "<type>", "data": ..}`.
pub const SIMPLE_KEY: &str = "$simple";

/// Key holding the exported data of a simple-value snapshot.
pub const SIMPLE_DATA_KEY: &str = "data";

/// Model type name embedded in every model snapshot.
pub const MODEL_TYPE_KEY: &str = "$modelType";

/// Stable model identity embedded in every model snapshot.
pub const MODEL_ID_KEY: &str = "$modelId";

/// Lifecycle action run once right after a model is constructed.
pub const ON_INIT_ACTION: &str = "$$onInit";

/// Built-in action wrapping [`Store::apply_patches`](crate::Store::apply_patches).
pub const APPLY_PATCHES_ACTION: &str = "$$applyPatches";

/// Built-in action wrapping [`Store::apply_snapshot`](crate::Store::apply_snapshot).
pub const APPLY_SNAPSHOT_ACTION: &str = "$$applySnapshot";
