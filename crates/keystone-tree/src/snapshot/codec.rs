//! JSON codec for snapshots.
//!
//! Simple values encode as `{"$simple": "<type name>", "data": <exported>}`;
//! every other shape maps one-to-one onto JSON.

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value};

use super::types::{Snapshot, SnapshotKind};
use crate::constants::{SIMPLE_DATA_KEY, SIMPLE_KEY};

impl Snapshot {
    /// Build a snapshot from plain JSON, recognising tagged simple values.
    pub fn from_json(value: &Value) -> Snapshot {
        match value {
            Value::Null => Snapshot::null(),
            Value::Bool(b) => Snapshot::from(*b),
            Value::Number(n) => Snapshot::new(SnapshotKind::Number(n.clone())),
            Value::String(s) => Snapshot::from(s.as_str()),
            Value::Array(items) => Snapshot::array(items.iter().map(Snapshot::from_json).collect()),
            Value::Object(map) => {
                if let Some((type_name, data)) = simple_parts(map) {
                    return Snapshot::simple(type_name, Snapshot::from_json(data));
                }
                let entries: IndexMap<String, Snapshot> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Snapshot::from_json(v)))
                    .collect();
                Snapshot::object(entries)
            }
        }
    }

    /// Plain JSON form of this snapshot.
    pub fn to_json(&self) -> Value {
        match self.kind() {
            SnapshotKind::Null => Value::Null,
            SnapshotKind::Bool(b) => Value::Bool(*b),
            SnapshotKind::Number(n) => Value::Number(n.clone()),
            SnapshotKind::String(s) => Value::String(s.clone()),
            SnapshotKind::Array(items) => {
                Value::Array(items.iter().map(Snapshot::to_json).collect())
            }
            SnapshotKind::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            SnapshotKind::Simple { type_name, data } => {
                let mut m = Map::new();
                m.insert(SIMPLE_KEY.into(), Value::String(type_name.clone()));
                m.insert(SIMPLE_DATA_KEY.into(), data.to_json());
                Value::Object(m)
            }
        }
    }
}

fn simple_parts(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 2 {
        return None;
    }
    let type_name = map.get(SIMPLE_KEY)?.as_str()?;
    let data = map.get(SIMPLE_DATA_KEY)?;
    Some((type_name, data))
}

impl From<Value> for Snapshot {
    fn from(value: Value) -> Self {
        Snapshot::from_json(&value)
    }
}

impl From<&Value> for Snapshot {
    fn from(value: &Value) -> Self {
        Snapshot::from_json(value)
    }
}

impl PartialEq<Value> for Snapshot {
    fn eq(&self, other: &Value) -> bool {
        self.to_json() == *other
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.kind() {
            SnapshotKind::Null => serializer.serialize_unit(),
            SnapshotKind::Bool(b) => serializer.serialize_bool(*b),
            SnapshotKind::Number(n) => n.serialize(serializer),
            SnapshotKind::String(s) => serializer.serialize_str(s),
            SnapshotKind::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            SnapshotKind::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            SnapshotKind::Simple { type_name, data } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(SIMPLE_KEY, type_name)?;
                map.serialize_entry(SIMPLE_DATA_KEY, data)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Snapshot::from_json(&v))
    }
}
