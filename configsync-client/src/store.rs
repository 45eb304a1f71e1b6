//! Thread-safe key store shared by the pull and push paths.

use configsync_core::{CacheEntry, Timestamp};
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent map from configuration key to cached entry.
///
/// An entry is inserted as one unit, so a concurrent reader observes either
/// the previous entry or the new one, never a value paired with the wrong
/// deadline. Entries are only ever superseded, never deleted; expiry is
/// checked lazily by the pull path, not swept.
#[derive(Clone, Default)]
pub struct KeyStore {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking read. Clones the entry out so no map guard escapes.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or overwrite atomically.
    pub fn set(&self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// True only if the key exists and its deadline is strictly before `now`.
    pub fn is_expired(&self, key: &str, now: Timestamp) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.is_expired_at(now))
            .unwrap_or(false)
    }

    /// Snapshot of every key the store has seen.
    pub fn known_keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
