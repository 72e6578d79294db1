//! Cache Entry Module
//!
//! Defines a single cached value together with its insertion and expiry instants.

use std::time::Duration;

use tokio::time::Instant;

/// Expiry used when `now + ttl` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// `now + ttl`, saturating to a far-future instant instead of overflowing.
fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
///
/// Instants come from the tokio clock so a paused test runtime controls expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the entry was inserted (or last overwritten)
    pub inserted_at: Instant,
    /// When the entry stops being visible
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry inserted at `now` that lives for `ttl`.
    pub fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: now,
            expires_at: expiry_after(now, ttl),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now`.
    ///
    /// An entry is expired once `now` reaches `expires_at`, so a zero TTL is
    /// already expired on the next lookup.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Refresh ==
    /// Pushes the expiry out to `now + ttl` without touching the value.
    pub fn refresh(&mut self, now: Instant, ttl: Duration) {
        self.expires_at = expiry_after(now, ttl);
    }

    // == Time To Live ==
    /// Returns the time left before expiry, `Duration::ZERO` once expired.
    pub fn ttl_remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// Age of the entry at `now`.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("track", now, Duration::from_secs(60));

        assert_eq!(entry.value, "track");
        assert_eq!(entry.inserted_at, now);
        assert_eq!(entry.expires_at, now + Duration::from_secs(60));
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_entry_expiration() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, now, Duration::from_secs(1));

        assert!(!entry.is_expired_at(now + Duration::from_millis(999)));
        assert!(entry.is_expired_at(now + Duration::from_millis(1100)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, now, Duration::from_secs(5));

        assert!(entry.is_expired_at(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, now, Duration::ZERO);

        assert!(entry.is_expired_at(now));
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, now, Duration::from_secs(10));

        assert_eq!(
            entry.ttl_remaining_at(now + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        // Saturates once expired
        assert_eq!(
            entry.ttl_remaining_at(now + Duration::from_secs(11)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_refresh_extends_expiry() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(1u32, now, Duration::from_secs(1));

        let later = now + Duration::from_secs(2);
        assert!(entry.is_expired_at(later));

        entry.refresh(later, Duration::from_secs(30));
        assert!(!entry.is_expired_at(later));
        assert_eq!(entry.age_at(later), Duration::from_secs(2));
    }

    #[test]
    fn test_unbounded_ttl_saturates() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(1u32, now, Duration::MAX);

        assert!(entry.expires_at > now);
        assert!(!entry.is_expired_at(now + Duration::from_secs(365 * 24 * 60 * 60)));

        entry.refresh(now, Duration::from_secs(u64::MAX));
        assert!(entry.ttl_remaining_at(now) >= FAR_FUTURE);
    }
}
