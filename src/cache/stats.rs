//! Cache Statistics Module
//!
//! Observability counters for a cache instance.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters.
///
/// `hits` and `misses` together count every `get`/`get_or_fetch` call exactly
/// once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Live entries at snapshot time
    pub size: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Entries dropped by the LRU policy
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    /// Returns a copy stamped with the current size and derived hit rate.
    pub fn snapshot(&self, size: usize) -> Self {
        Self {
            size,
            hit_rate: self.hit_rate(),
            ..self.clone()
        }
    }
}
