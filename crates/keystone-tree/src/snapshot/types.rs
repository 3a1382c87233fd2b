//! Immutable, structurally shared snapshot values.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Number;

use crate::constants::{MODEL_ID_KEY, MODEL_TYPE_KEY};

// ── Snapshot ──────────────────────────────────────────────────────────────

/// Immutable point-in-time value of a tracked node (or of a leaf).
///
/// Cloning is O(1). Unchanged subtrees of consecutive snapshots of the same
/// node are the *same* allocation, so [`Snapshot::ptr_eq`] can be used for
/// cheap change detection. `==` compares structurally.
#[derive(Clone)]
pub struct Snapshot(Arc<SnapshotKind>);

/// The shape of a [`Snapshot`].
#[derive(Debug, PartialEq)]
pub enum SnapshotKind {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Snapshot>),
    /// Keyed mapping. Insertion order is kept but ignored by `==`.
    Object(IndexMap<String, Snapshot>),
    /// Exported data of an opaque simple value, tagged with its type name so
    /// it can be imported again without runtime type identity.
    Simple { type_name: String, data: Snapshot },
}

impl Snapshot {
    pub fn new(kind: SnapshotKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn null() -> Self {
        Self::new(SnapshotKind::Null)
    }

    pub fn array(items: Vec<Snapshot>) -> Self {
        Self::new(SnapshotKind::Array(items))
    }

    pub fn object(entries: IndexMap<String, Snapshot>) -> Self {
        Self::new(SnapshotKind::Object(entries))
    }

    pub fn simple(type_name: impl Into<String>, data: Snapshot) -> Self {
        Self::new(SnapshotKind::Simple {
            type_name: type_name.into(),
            data,
        })
    }

    #[inline]
    pub fn kind(&self) -> &SnapshotKind {
        &self.0
    }

    /// Returns true if both handles point at the same snapshot allocation.
    #[inline]
    pub fn ptr_eq(a: &Snapshot, b: &Snapshot) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Arrays, objects and simple values become tracked nodes; everything
    /// else is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self.kind(),
            SnapshotKind::Null
                | SnapshotKind::Bool(_)
                | SnapshotKind::Number(_)
                | SnapshotKind::String(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind(), SnapshotKind::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind() {
            SnapshotKind::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.kind() {
            SnapshotKind::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind() {
            SnapshotKind::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.kind() {
            SnapshotKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Snapshot]> {
        match self.kind() {
            SnapshotKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Snapshot>> {
        match self.kind() {
            SnapshotKind::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Child by key: object entry, or array element when `key` is an index.
    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        match self.kind() {
            SnapshotKind::Object(entries) => entries.get(key),
            SnapshotKind::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// `$modelType` of a model snapshot.
    pub fn model_type(&self) -> Option<&str> {
        self.get(MODEL_TYPE_KEY).and_then(Snapshot::as_str)
    }

    /// `$modelId` of a model snapshot.
    pub fn model_id(&self) -> Option<&str> {
        self.get(MODEL_ID_KEY).and_then(Snapshot::as_str)
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        Snapshot::ptr_eq(self, other) || self.0 == other.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

// ── Conversions ───────────────────────────────────────────────────────────

impl From<bool> for Snapshot {
    fn from(b: bool) -> Self {
        Self::new(SnapshotKind::Bool(b))
    }
}

impl From<i64> for Snapshot {
    fn from(n: i64) -> Self {
        Self::new(SnapshotKind::Number(n.into()))
    }
}

/// Non-finite floats have no JSON form and become `null`.
impl From<f64> for Snapshot {
    fn from(n: f64) -> Self {
        Number::from_f64(n)
            .map(|n| Self::new(SnapshotKind::Number(n)))
            .unwrap_or_else(Self::null)
    }
}

impl From<&str> for Snapshot {
    fn from(s: &str) -> Self {
        Self::new(SnapshotKind::String(s.to_owned()))
    }
}

impl From<String> for Snapshot {
    fn from(s: String) -> Self {
        Self::new(SnapshotKind::String(s))
    }
}
