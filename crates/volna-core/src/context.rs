//! Dispatch context passed alongside every event.
//!
//! The context is an open string-to-JSON map. Callers seed it before
//! propagation; filters enrich it through [`Verdict::AcceptWith`]
//! (volna_core::dispatch::Verdict) and the enriched view is what later
//! filters in the same chain and the final handler observe.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Opaque per-handler metadata, contributed to by filters at registration.
pub type Flags = HashMap<String, Value>;

/// Key-value context threaded through filter chains and handler calls.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<String, Value>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous one under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the raw value under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value under `key` as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the value under `key` as an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Returns the value under `key` as a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Merges a filter patch into the context, overwriting existing keys.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.values.insert(key, value);
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the context holds no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}
