//! Record types flowing through the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::key::KeyPath;

/// One key-value pair as delivered by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawEntry {
    /// Full key of the entry.
    pub key: KeyPath,

    /// Stored payload. Always a JSON object.
    pub value: Map<String, Value>,

    /// Write version assigned by the store (20 hex digits).
    pub versionstamp: String,
}

impl RawEntry {
    pub fn new(key: KeyPath, value: Map<String, Value>, versionstamp: impl Into<String>) -> Self {
        Self {
            key,
            value,
            versionstamp: versionstamp.into(),
        }
    }

    /// The entry's own fields, in entry order: `key`, `value`, `versionstamp`.
    pub fn metadata(&self) -> FlatRecord {
        let mut record = FlatRecord::new();
        record.insert("key", self.key.to_json());
        record.insert("value", Value::Object(self.value.clone()));
        record.insert("versionstamp", Value::String(self.versionstamp.clone()));
        record
    }
}

/// A flat, insertion-ordered view of an entry, ready for display.
///
/// Writing a field that already exists replaces its value but keeps its
/// position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord(Map<String, Value>);

impl FlatRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a field, returning the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Overlay `fields` in iteration order; on collision the later value wins.
    pub fn merge<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (name, value) in fields {
            self.0.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in display order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only the fields for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.0.retain(|name, _| keep(name));
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for FlatRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl IntoIterator for FlatRecord {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySegment;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_merge_last_write_wins_keeps_position() {
        let mut record = FlatRecord::from(object(json!({"a": 1, "b": 2})));
        record.merge(object(json!({"c": 3, "a": 10})));

        assert_eq!(record.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(record.get("a"), Some(&json!(10)));
    }

    #[test]
    fn test_metadata_fields() {
        let entry = RawEntry::new(
            KeyPath::new(vec![KeySegment::from("logs"), KeySegment::from(1)]),
            object(json!({"msg": "hi"})),
            "00000000000000000001",
        );
        let record = entry.metadata();

        assert_eq!(record.names().collect::<Vec<_>>(), vec!["key", "value", "versionstamp"]);
        assert_eq!(record.get("key"), Some(&json!(["logs", 1])));
        assert_eq!(record.get("value"), Some(&json!({"msg": "hi"})));
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut record = FlatRecord::from(object(json!({"x": 1, "y": 2, "z": 3})));
        record.retain(|name| name != "y");
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["x", "z"]);
    }
}
