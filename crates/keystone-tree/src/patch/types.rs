//! The patch value type and its JSON form.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::Path;
use crate::snapshot::Snapshot;

/// One elementary change. Serializes as
/// `{"op": "add" | "remove" | "replace", "path": [..], "value": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Patch {
    Add { path: Path, value: Snapshot },
    Remove { path: Path },
    Replace { path: Path, value: Snapshot },
}

impl Patch {
    pub fn op_name(&self) -> &'static str {
        match self {
            Patch::Add { .. } => "add",
            Patch::Remove { .. } => "remove",
            Patch::Replace { .. } => "replace",
        }
    }

    pub fn path(&self) -> &[String] {
        match self {
            Patch::Add { path, .. } | Patch::Remove { path } | Patch::Replace { path, .. } => path,
        }
    }

    pub fn value(&self) -> Option<&Snapshot> {
        match self {
            Patch::Add { value, .. } | Patch::Replace { value, .. } => Some(value),
            Patch::Remove { .. } => None,
        }
    }

    /// Copy of the patch with `prefix` prepended to its path.
    pub fn prefixed(&self, prefix: &[String]) -> Patch {
        if prefix.is_empty() {
            return self.clone();
        }
        let join = |path: &Path| -> Path { prefix.iter().chain(path.iter()).cloned().collect() };
        match self {
            Patch::Add { path, value } => Patch::Add { path: join(path), value: value.clone() },
            Patch::Remove { path } => Patch::Remove { path: join(path) },
            Patch::Replace { path, value } => Patch::Replace {
                path: join(path),
                value: value.clone(),
            },
        }
    }
}

/// Encode a patch list as a single snapshot (used as action argument).
pub(crate) fn patches_to_snapshot(patches: &[Patch]) -> Result<Snapshot> {
    Ok(Snapshot::from(serde_json::to_value(patches)?))
}

pub(crate) fn patches_from_snapshot(snapshot: &Snapshot) -> Result<Vec<Patch>> {
    Ok(serde_json::from_value(snapshot.to_json())?)
}
