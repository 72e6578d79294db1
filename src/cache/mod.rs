//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction, plus the
//! read-through `get_or_fetch` path used for search and query results.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use shared::Cache;
pub use stats::CacheStats;
pub use store::CacheStore;
