// In-process cache store.
// Maps request keys to response bodies for the lifetime of the store. No expiry, no eviction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::key::RequestKey;

/// A stored response body with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The cached response body.
    pub body: Value,
    /// When the body was stored. Informational only.
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            cached_at: Utc::now(),
        }
    }
}

/// Shared key to entry mapping. Clones refer to the same entries.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    entries: Arc<Mutex<HashMap<RequestKey, CacheEntry>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // The map stays consistent even if a holder panicked: every critical
    // section is a single HashMap call.
    fn lock(&self) -> MutexGuard<'_, HashMap<RequestKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up the entry for a key.
    pub fn get(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Store a body, replacing any prior entry. Returns the replaced entry.
    pub fn insert(&self, key: RequestKey, body: Value) -> Option<CacheEntry> {
        self.lock().insert(key, CacheEntry::new(body))
    }

    pub fn remove(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.lock().remove(key)
    }

    /// Delete all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of stored keys, sorted.
    pub fn keys(&self) -> Vec<RequestKey> {
        let mut keys: Vec<RequestKey> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}
