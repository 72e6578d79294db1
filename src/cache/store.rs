//! Cache Store Module
//!
//! Synchronous cache engine combining HashMap storage with LRU tracking and
//! TTL expiration. The async [`Cache`](crate::cache::Cache) handle wraps one of
//! these behind a mutex; every method takes the current instant so the store
//! itself never reads a clock.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Cache Store ==
/// Bounded, expiring key-value storage.
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    stats: CacheStats,
    max_entries: usize,
    default_ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries, each living for
    /// `default_ttl` unless set with an explicit TTL.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry and resetting its TTL.
    ///
    /// Inserting a new key into a full store evicts the least recently used
    /// entry first. A store with capacity 0 keeps nothing: the value is
    /// counted as evicted straight away.
    pub fn set(&mut self, key: String, value: V, ttl: Option<Duration>, now: Instant) {
        if self.max_entries == 0 {
            self.stats.record_eviction();
            return;
        }

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_entries {
                let Some(evicted) = self.lru.evict_oldest() else {
                    break;
                };
                let age = self.entries.remove(&evicted).map(|entry| entry.age_at(now));
                self.stats.record_eviction();
                debug!(key = %evicted, age = ?age, "evicted least recently used entry");
            }
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, now, ttl));
    }

    // == Lookup ==
    /// Returns the live value for `key`, promoting it to most recently used.
    ///
    /// Records exactly one hit or miss. An expired entry is removed on the
    /// spot and reported as a miss.
    pub fn lookup(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            self.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Remove ==
    /// Removes an entry. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            true
        } else {
            false
        }
    }

    // == Remove Matching ==
    /// Removes every entry whose key contains `pattern`. Returns the count.
    pub fn remove_matching(&mut self, pattern: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.contains(pattern))
            .cloned()
            .collect();

        for key in &keys {
            self.remove(key);
        }
        keys.len()
    }

    // == Expired Keys ==
    /// Lists the keys of every entry expired at `now`.
    pub fn expired_keys(&self, now: Instant) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Removes `key` only if it is still expired at `now`.
    ///
    /// The entry may have been overwritten since the key was listed, so the
    /// expiry is checked again here.
    pub fn remove_if_expired(&mut self, key: &str, now: Instant) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));

        if expired {
            self.remove(key);
            self.stats.record_expirations(1);
        }
        expired
    }

    // == Cleanup Expired ==
    /// Removes all expired entries in one pass. Returns the number removed.
    pub fn cleanup_expired(&mut self, now: Instant) -> usize {
        self.expired_keys(now)
            .iter()
            .filter(|key| self.remove_if_expired(key, now))
            .count()
    }

    // == Touch ==
    /// Resets the expiry of a live entry to `now + ttl` (default TTL if none).
    ///
    /// Does not change the value or its LRU position.
    pub fn touch(&mut self, key: &str, ttl: Option<Duration>, now: Instant) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.refresh(now, ttl);
                true
            }
            _ => false,
        }
    }

    /// Time left before a live entry expires.
    pub fn ttl_remaining(&self, key: &str, now: Instant) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.ttl_remaining_at(now))
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
