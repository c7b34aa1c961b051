//! Identity map: at most one live record handle per primary key.
//!
//! Within one repository instance, every row loaded or saved is registered
//! here under its primary-key value, so repeated lookups observe the same
//! shared [`RecordRef`]. The newest load or save wins; there is no
//! versioning or conflict detection, and entries live until the repository
//! is dropped.

use rowgate_core::{RecordRef, Value};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash a primary-key value: a type tag plus the value's bit pattern, so
/// `Int(1)` and `Text("1")` occupy different slots.
fn hash_key(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    match value {
        Value::Null => 0u8.hash(&mut hasher),
        Value::Bool(b) => {
            1u8.hash(&mut hasher);
            b.hash(&mut hasher);
        }
        Value::Int(i) => {
            2u8.hash(&mut hasher);
            i.hash(&mut hasher);
        }
        Value::Float(f) => {
            3u8.hash(&mut hasher);
            f.to_bits().hash(&mut hasher);
        }
        Value::Text(s) => {
            4u8.hash(&mut hasher);
            s.hash(&mut hasher);
        }
        Value::Bytes(b) => {
            5u8.hash(&mut hasher);
            b.hash(&mut hasher);
        }
        Value::Json(j) => {
            6u8.hash(&mut hasher);
            j.to_string().hash(&mut hasher);
        }
    }
    hasher.finish()
}

/// An entry keeps the original key value so a hash collision can never
/// alias two different keys.
struct IdentityEntry {
    key: Value,
    record: RecordRef,
}

/// Map from primary-key value to the single live record handle for it.
#[derive(Default)]
pub struct IdentityMap {
    entries: HashMap<u64, IdentityEntry>,
}

impl IdentityMap {
    /// Create a new empty identity map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a record under a key, replacing any previous handle for
    /// that key (last read or save wins).
    pub fn insert(&mut self, key: Value, record: RecordRef) {
        self.entries
            .insert(hash_key(&key), IdentityEntry { key, record });
    }

    /// Get the live handle for a key, if one is registered.
    pub fn get(&self, key: &Value) -> Option<RecordRef> {
        let entry = self.entries.get(&hash_key(key))?;
        (entry.key == *key).then(|| RecordRef::clone(&entry.record))
    }

    /// Check if a key is registered.
    pub fn contains(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Drop the handle for a key. Returns `true` if one was registered.
    pub fn remove(&mut self, key: &Value) -> bool {
        let hash = hash_key(key);
        if self.entries.get(&hash).is_some_and(|e| e.key == *key) {
            self.entries.remove(&hash);
            return true;
        }
        false
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
