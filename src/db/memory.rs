// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local document store.
//!
//! Documents are kept as JSON values keyed by `(collection, id)`, so the
//! same serde shapes go in and out as with Firestore.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

/// In-memory document collections.
#[derive(Default)]
pub struct MemoryStore {
    docs: DashMap<(String, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.docs
            .get(&(collection.to_string(), id.to_string()))
            .map(|doc| doc.value().clone())
    }

    /// Create or replace a document.
    pub fn set(&self, collection: &str, id: &str, doc: Value) {
        self.docs
            .insert((collection.to_string(), id.to_string()), doc);
    }

    /// Create a document only if the ID is free. Returns `false` if it already existed.
    pub fn insert(&self, collection: &str, id: &str, doc: Value) -> bool {
        match self.docs.entry((collection.to_string(), id.to_string())) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(doc);
                true
            }
        }
    }

    pub fn delete(&self, collection: &str, id: &str) {
        self.docs.remove(&(collection.to_string(), id.to_string()));
    }

    /// All documents of a collection whose top-level `field` equals the string `value`.
    pub fn query_eq(&self, collection: &str, field: &str, value: &str) -> Vec<Value> {
        self.docs
            .iter()
            .filter(|doc| doc.key().0 == collection)
            .filter(|doc| doc.value().get(field).and_then(Value::as_str) == Some(value))
            .map(|doc| doc.value().clone())
            .collect()
    }

    pub fn list(&self, collection: &str) -> Vec<Value> {
        self.docs
            .iter()
            .filter(|doc| doc.key().0 == collection)
            .map(|doc| doc.value().clone())
            .collect()
    }
}
