//! Replay cache for `Idempotency-Key` requests.
//!
//! Successful responses are kept per (user, key) until their TTL expires or
//! the cache reaches its entry bound, whichever comes first. Expired entries
//! are also dropped by the periodic sweep started in [`crate::scheduler`].

use std::time::{Duration, Instant};

use dashmap::DashMap;

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

/// Longest accepted `Idempotency-Key` value.
pub const MAX_KEY_LEN: usize = 255;

struct CachedEntry<V> {
    value: V,
    stored_at: Instant,
}

pub struct IdempotencyCache<V> {
    entries: DashMap<(String, String), CachedEntry<V>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> IdempotencyCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached value unless it has expired.
    pub fn get(&self, user_id: &str, key: &str) -> Option<V> {
        let cache_key = (user_id.to_string(), key.to_string());
        let now = Instant::now();
        if let Some(entry) = self.entries.get(&cache_key) {
            if now.duration_since(entry.stored_at) < self.ttl {
                return Some(entry.value.clone());
            }
        }
        self.entries
            .remove_if(&cache_key, |_, entry| now.duration_since(entry.stored_at) >= self.ttl);
        None
    }

    pub fn insert(&self, user_id: &str, key: &str, value: V) {
        let cache_key = (user_id.to_string(), key.to_string());
        if !self.entries.contains_key(&cache_key) && self.entries.len() >= self.max_entries {
            self.evict_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }
        self.entries.insert(
            cache_key,
            CachedEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().stored_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
