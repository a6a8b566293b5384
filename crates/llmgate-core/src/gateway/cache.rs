//! Short-TTL response cache.
//!
//! Entries are visible strictly before their expiry instant; an expired
//! entry is indistinguishable from one that was never set. Values are
//! cloned on read so no `DashMap` guard outlives the call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// A cached value and the instant it stops being visible.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

/// Deterministic cache key: route, caller key, and SHA-256 of the prompt.
pub fn cache_key(route: &str, caller: &str, prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    format!("{route}:{caller}:{digest:x}")
}

/// Every this many `set`s, expired entries are swept.
const PURGE_EVERY: usize = 64;

/// In-memory TTL cache keyed by [`cache_key`].
///
/// Expired entries are dropped when read, and swept in bulk every 64
/// stores so keys that are never read again do not pile up.
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    sets: AtomicUsize,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            sets: AtomicUsize::new(0),
        }
    }

    /// Return the value for `key` if it has not yet expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| now >= entry.expires_at);
        }
        None
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.into(), entry);

        if self.sets.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            let removed = self.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = self.entries.len(), "Purged expired cache entries");
            }
        }
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including any not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
