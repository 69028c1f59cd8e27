//! The shared key/value map threaded through a pipeline run.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Free-form key/value state shared by reference.
///
/// Cloning a `SharedData` yields another handle to the same map, which is how a
/// parent pipeline and every sub-pipeline it spawns observe each other's
/// writes. Concurrent writers to the same key race; the last write wins.
#[derive(Debug, Clone, Default)]
pub struct SharedData {
    data: Arc<RwLock<Map<String, Value>>>,
}

impl SharedData {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map seeded with `data`.
    #[must_use]
    pub fn from_map(data: Map<String, Value>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Sets a value, overwriting any previous one.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.data.write().insert(key.into(), value);
    }

    /// Removes a value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data.write().remove(key)
    }

    /// Runs `f` with exclusive access to the map.
    ///
    /// Use this for read-modify-write sequences that must not interleave.
    pub fn update<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        f(&mut self.data.write())
    }

    /// Runs `f` with shared access to the map.
    pub fn with<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        f(&self.data.read())
    }

    /// Returns a copy of all data.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.data.read().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Returns all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Returns true if both handles refer to the same map.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl From<Map<String, Value>> for SharedData {
    fn from(data: Map<String, Value>) -> Self {
        Self::from_map(data)
    }
}
