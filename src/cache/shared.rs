//! Shared Cache Module
//!
//! Async, cloneable handle over a [`CacheStore`] with read-through fetching.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::error::FetchError;

/// Expired keys removed per store lock acquisition during cleanup
const CLEANUP_BATCH_SIZE: usize = 64;

// == Cache ==
/// Async-safe TTL/LRU cache from string keys to `V`.
///
/// Clones share the same storage. Plain operations (`get`, `set`, ...) only
/// hold the store lock for the duration of a map operation. `get_or_fetch`
/// additionally takes one coarse per-instance fetch lock for its whole
/// check-fetch-store sequence, so at most one fetch is in flight per cache,
/// whatever the key. A fetcher must therefore not call `get_or_fetch` on the
/// same cache.
pub struct Cache<V> {
    inner: Arc<Inner<V>>,
}

struct Inner<V> {
    store: Mutex<CacheStore<V>>,
    fetch_lock: Arc<Mutex<()>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + 'static,
{
    // == Constructor ==
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(CacheStore::new(max_entries, default_ttl)),
                fetch_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    // == Get ==
    /// Returns the live value for `key`, promoting it to most recently used.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.store.lock().await.lookup(key, Instant::now())
    }

    // == Get Or Fetch ==
    /// Read-through lookup storing fetched values with the default TTL.
    ///
    /// On a miss `fetcher` is invoked and its future awaited; a successful
    /// result is cached and returned, a failure is returned unchanged and
    /// nothing is cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<V, FetchError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Send + 'static,
    {
        self.fetch_through(key, None, fetcher).await
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), storing with `ttl`.
    pub async fn get_or_fetch_with_ttl<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetcher: F,
    ) -> Result<V, FetchError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Send + 'static,
    {
        self.fetch_through(key, Some(ttl), fetcher).await
    }

    async fn fetch_through<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetcher: F,
    ) -> Result<V, FetchError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Send + 'static,
    {
        let fetch_guard = Arc::clone(&self.inner.fetch_lock).lock_owned().await;

        if let Some(value) = self.inner.store.lock().await.lookup(key, Instant::now()) {
            return Ok(value);
        }

        debug!(key, "cache miss, fetching");

        // The fetch owns the lock guard and runs detached, so a caller that
        // gives up still leaves the value cached for whoever comes next.
        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_string();
        let fetch = fetcher();
        let task = tokio::spawn(async move {
            let _fetch_guard = fetch_guard;
            let result = fetch.await;
            // No borrow of `result` may live across the lock await; V need not be Sync
            let fetched = result.as_ref().ok().cloned();
            if let Some(value) = fetched {
                inner
                    .store
                    .lock()
                    .await
                    .set(owned_key, value, ttl, Instant::now());
            }
            result
        });

        match task.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(key, "fetch failed, nothing cached");
                Err(FetchError::Fetcher(err))
            }
            Err(join_err) if join_err.is_panic() => std::panic::resume_unwind(join_err.into_panic()),
            Err(_) => {
                warn!(key, "fetch task cancelled before completing");
                Err(FetchError::Aborted(key.to_string()))
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` with the default TTL.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.inner
            .store
            .lock()
            .await
            .set(key.into(), value, None, Instant::now());
    }

    /// Stores `value` under `key` for `ttl`.
    pub async fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.inner
            .store
            .lock()
            .await
            .set(key.into(), value, Some(ttl), Instant::now());
    }

    // == Invalidate ==
    /// Removes `key` if present. Returns whether anything was removed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.inner.store.lock().await.remove(key)
    }

    /// Removes every entry whose key contains `pattern`.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        let removed = self.inner.store.lock().await.remove_matching(pattern);
        debug!(pattern, removed, "invalidated matching keys");
        removed
    }

    // == Cleanup Expired ==
    /// Removes every expired entry, returning how many were dropped.
    ///
    /// Expired keys are listed under one short lock, then removed in batches
    /// that each re-take the lock and re-check expiry, yielding in between so
    /// request traffic is never stalled behind a full sweep.
    pub async fn cleanup_expired(&self) -> usize {
        let expired = self.inner.store.lock().await.expired_keys(Instant::now());

        let mut removed = 0;
        for batch in expired.chunks(CLEANUP_BATCH_SIZE) {
            {
                let mut store = self.inner.store.lock().await;
                let now = Instant::now();
                removed += batch
                    .iter()
                    .filter(|key| store.remove_if_expired(key, now))
                    .count();
            }
            tokio::task::yield_now().await;
        }
        removed
    }

    /// Resets the expiry of a live entry; `None` uses the default TTL.
    pub async fn touch(&self, key: &str, ttl: Option<Duration>) -> bool {
        self.inner.store.lock().await.touch(key, ttl, Instant::now())
    }

    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.inner.store.lock().await.ttl_remaining(key, Instant::now())
    }

    pub async fn clear(&self) {
        self.inner.store.lock().await.clear();
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        self.inner.store.lock().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.store.lock().await.is_empty()
    }
}
