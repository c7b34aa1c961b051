//! Schema-less ordered records.

use crate::value::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::{Arc, RwLock};

/// A shared handle to a record.
///
/// Repositories hand out `RecordRef`s so that the identity map, the write
/// queue, and the caller all observe the same underlying record. Getting
/// the same primary key twice yields handles to the same record.
pub type RecordRef = Arc<RwLock<Record>>;

/// An ordered, schema-less keyed-property record.
///
/// Fields are whatever a storage row or a caller supplied; insertion order
/// is preserved and is the order fields are written back to storage.
/// Setting an existing field replaces its value in place without moving it.
///
/// # Examples
///
/// ```
/// use rowgate_core::{Record, Value};
///
/// let mut rec = Record::new();
/// rec.set("name", "Ada");
/// rec.set("age", 36);
/// assert_eq!(rec.get("name"), Some(&Value::Text("Ada".into())));
/// assert_eq!(rec.keys().collect::<Vec<_>>(), vec!["name", "age"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create a new empty record.
    #[must_use]
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Create a record from an ordered sequence of field pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut rec = Self::new();
        for (k, v) in pairs {
            rec.set(k, v);
        }
        rec
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Set a field value, replacing in place if the field already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Check if a field exists (even if it holds NULL).
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// Remove a field, returning its value if it was present.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Replace every field with the given pairs.
    pub fn populate<K, V, I>(&mut self, pairs: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.fields.clear();
        for (k, v) in pairs {
            self.set(k, v);
        }
    }

    /// Export the fields as ordered `(name, value)` pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, Value)> {
        self.fields.clone()
    }

    /// A copy of this record with one field left out.
    ///
    /// Used when building write payloads that must exclude the key column.
    #[must_use]
    pub fn without(&self, name: &str) -> Record {
        Record {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| k != name)
                .cloned()
                .collect(),
        }
    }

    /// Number of populated fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Wrap this record in a shared handle.
    #[must_use]
    pub fn into_shared(self) -> RecordRef {
        Arc::new(RwLock::new(self))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

// Records serialize as maps so they interchange cleanly with JSON rows;
// field order is preserved on both ends.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut rec = Record::new();
                while let Some((k, v)) = access.next_entry::<String, Value>()? {
                    rec.set(k, v);
                }
                Ok(rec)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}
