//! Vote Coordinator Module
//!
//! Per-(guild, kind) tallies mutated under per-key async locks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::votes::{GuildId, UserId, VoteKind, VoteOutcome, VoteTally};

/// How long a tally stays open after its first vote
pub const DEFAULT_VOTE_WINDOW: Duration = Duration::from_secs(5 * 60);

type VoteKey = (GuildId, VoteKind);

// == Vote Coordinator ==
/// Collects one vote per user toward a quorum, per guild and vote kind.
///
/// Each (guild, kind) pair has its own lock, created on first use and kept for
/// the life of the process. Casting, clearing and sweeping a tally all hold
/// that lock, so two concurrent votes can never both see the same stale count
/// and resolve twice. Different pairs never contend.
#[derive(Debug)]
pub struct VoteCoordinator {
    tallies: DashMap<VoteKey, VoteTally>,
    locks: DashMap<VoteKey, Arc<Mutex<()>>>,
    window: TimeDelta,
}

impl Default for VoteCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_VOTE_WINDOW)
    }
}

impl VoteCoordinator {
    // == Constructor ==
    pub fn new(window: Duration) -> Self {
        Self {
            tallies: DashMap::new(),
            locks: DashMap::new(),
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
        }
    }

    fn lock_for(&self, key: &VoteKey) -> Arc<Mutex<()>> {
        let lock = self.locks.entry(key.clone()).or_default();
        Arc::clone(lock.value())
    }

    // == Cast Vote ==
    /// Records `user_id`'s vote and reports whether it reached the quorum.
    ///
    /// The first vote opens a tally for the configured window. A repeat vote
    /// from the same user is reported as `already_voted` without changing the
    /// count. The vote that brings the count to `required_votes` clears the
    /// tally and is the only one to see `threshold_met`; the next vote opens a
    /// fresh tally. A `required_votes` of 0 resolves on the first vote.
    pub async fn cast_vote(
        &self,
        guild_id: GuildId,
        kind: impl Into<VoteKind>,
        user_id: UserId,
        required_votes: usize,
    ) -> VoteOutcome {
        let key = (guild_id, kind.into());
        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;

        self.record_vote(key, user_id, required_votes, Utc::now())
    }

    /// Vote bookkeeping; the caller holds the key's lock.
    fn record_vote(
        &self,
        key: VoteKey,
        user_id: UserId,
        required_votes: usize,
        now: DateTime<Utc>,
    ) -> VoteOutcome {
        let (added, current_count) = {
            let mut tally = self
                .tallies
                .entry(key.clone())
                .or_insert_with(|| VoteTally::open(now, self.window));
            if tally.is_expired_at(now) {
                debug!(guild_id = key.0, kind = %key.1, "discarding stale tally");
                *tally = VoteTally::open(now, self.window);
            }
            let added = tally.add(user_id);
            (added, tally.count())
        };

        if !added {
            debug!(guild_id = key.0, kind = %key.1, user_id, "duplicate vote ignored");
            return VoteOutcome {
                already_voted: true,
                current_count,
                threshold_met: false,
            };
        }

        let threshold_met = current_count >= required_votes;
        if threshold_met {
            self.tallies.remove(&key);
            info!(
                guild_id = key.0,
                kind = %key.1,
                votes = current_count,
                required_votes,
                "vote passed"
            );
        } else {
            debug!(
                guild_id = key.0,
                kind = %key.1,
                votes = current_count,
                required_votes,
                "vote recorded"
            );
        }

        VoteOutcome {
            already_voted: false,
            current_count,
            threshold_met,
        }
    }

    // == Clear Votes ==
    /// Drops the tally for one (guild, kind), e.g. after the track changed.
    pub async fn clear_votes(&self, guild_id: GuildId, kind: impl Into<VoteKind>) -> bool {
        let key = (guild_id, kind.into());
        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;

        self.tallies.remove(&key).is_some()
    }

    /// Drops every tally of a guild. Returns how many were open.
    pub async fn clear_guild(&self, guild_id: GuildId) -> usize {
        let keys: Vec<VoteKey> = self
            .tallies
            .iter()
            .filter(|entry| entry.key().0 == guild_id)
            .map(|entry| entry.key().clone())
            .collect();

        let mut cleared = 0;
        for key in keys {
            let lock = self.lock_for(&key);
            let _guard = lock.lock().await;
            if self.tallies.remove(&key).is_some() {
                cleared += 1;
            }
        }
        cleared
    }

    /// Live vote count for one (guild, kind); 0 when no tally is open.
    pub fn vote_count(&self, guild_id: GuildId, kind: impl Into<VoteKind>) -> usize {
        let now = Utc::now();
        self.tallies
            .get(&(guild_id, kind.into()))
            .filter(|tally| !tally.is_expired_at(now))
            .map(|tally| tally.count())
            .unwrap_or(0)
    }

    /// Number of open tallies across all guilds.
    pub fn active_tallies(&self) -> usize {
        self.tallies.len()
    }

    // == Sweep Expired ==
    /// Removes every tally whose window ended before `now`.
    ///
    /// Each removal takes that tally's own lock and re-checks expiry, so a vote
    /// in progress is never torn away mid-update.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<VoteKey> = self
            .tallies
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            let lock = self.lock_for(&key);
            let _guard = lock.lock().await;
            if let Some(((guild_id, kind), tally)) = self
                .tallies
                .remove_if(&key, |_, tally| tally.is_expired_at(now))
            {
                debug!(
                    guild_id,
                    kind = %kind,
                    votes = tally.count(),
                    open_secs = (now - tally.opened_at()).num_seconds(),
                    "swept expired vote tally"
                );
                removed += 1;
            }
        }
        removed
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = 1_000;

    #[tokio::test]
    async fn test_quorum_resolves_and_resets() {
        let votes = VoteCoordinator::default();

        let first = votes.cast_vote(GUILD, VoteKind::Skip, 1, 2).await;
        assert_eq!(
            first,
            VoteOutcome {
                already_voted: false,
                current_count: 1,
                threshold_met: false
            }
        );

        let second = votes.cast_vote(GUILD, VoteKind::Skip, 2, 2).await;
        assert!(second.threshold_met);
        assert_eq!(second.current_count, 2);
        assert_eq!(votes.active_tallies(), 0);

        // Resolution starts a fresh tally
        let again = votes.cast_vote(GUILD, VoteKind::Skip, 1, 2).await;
        assert!(!again.already_voted);
        assert!(!again.threshold_met);
        assert_eq!(again.current_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_vote_reports_already_voted() {
        let votes = VoteCoordinator::default();

        votes.cast_vote(GUILD, VoteKind::Skip, 1, 3).await;
        let repeat = votes.cast_vote(GUILD, VoteKind::Skip, 1, 3).await;

        assert!(repeat.already_voted);
        assert!(!repeat.threshold_met);
        assert_eq!(repeat.current_count, 1);
        assert_eq!(votes.vote_count(GUILD, VoteKind::Skip), 1);
    }

    #[tokio::test]
    async fn test_zero_required_votes_resolves_immediately() {
        let votes = VoteCoordinator::default();

        let outcome = votes.cast_vote(GUILD, VoteKind::Previous, 1, 0).await;

        assert!(outcome.threshold_met);
        assert_eq!(outcome.current_count, 1);
        assert_eq!(votes.active_tallies(), 0);
    }

    #[tokio::test]
    async fn test_kinds_and_guilds_are_independent() {
        let votes = VoteCoordinator::default();

        votes.cast_vote(GUILD, VoteKind::Skip, 1, 5).await;
        votes.cast_vote(GUILD, VoteKind::Previous, 1, 5).await;
        votes.cast_vote(GUILD + 1, "skip", 1, 5).await;

        assert_eq!(votes.vote_count(GUILD, VoteKind::Skip), 1);
        assert_eq!(votes.vote_count(GUILD, VoteKind::Previous), 1);
        assert_eq!(votes.vote_count(GUILD + 1, VoteKind::Skip), 1);
        assert_eq!(votes.active_tallies(), 3);
    }

    #[tokio::test]
    async fn test_clear_votes() {
        let votes = VoteCoordinator::default();
        votes.cast_vote(GUILD, VoteKind::Skip, 1, 3).await;

        assert!(votes.clear_votes(GUILD, VoteKind::Skip).await);
        assert!(!votes.clear_votes(GUILD, VoteKind::Skip).await);

        let outcome = votes.cast_vote(GUILD, VoteKind::Skip, 1, 3).await;
        assert!(!outcome.already_voted);
        assert_eq!(outcome.current_count, 1);
    }

    #[tokio::test]
    async fn test_clear_guild_only_touches_that_guild() {
        let votes = VoteCoordinator::default();
        votes.cast_vote(GUILD, VoteKind::Skip, 1, 3).await;
        votes.cast_vote(GUILD, VoteKind::Previous, 1, 3).await;
        votes.cast_vote(GUILD + 1, VoteKind::Skip, 1, 3).await;

        assert_eq!(votes.clear_guild(GUILD).await, 2);
        assert_eq!(votes.active_tallies(), 1);
        assert_eq!(votes.vote_count(GUILD + 1, VoteKind::Skip), 1);
    }

    #[tokio::test]
    async fn test_sweep_removes_aged_tally() {
        let votes = VoteCoordinator::default();
        votes.cast_vote(GUILD, VoteKind::Skip, 1, 3).await;
        votes.cast_vote(GUILD, VoteKind::Skip, 2, 3).await;

        assert_eq!(votes.sweep_expired(Utc::now()).await, 0);

        let aged = Utc::now() + TimeDelta::minutes(6);
        assert_eq!(votes.sweep_expired(aged).await, 1);
        assert_eq!(votes.active_tallies(), 0);

        let fresh = votes.cast_vote(GUILD, VoteKind::Skip, 1, 3).await;
        assert!(!fresh.already_voted);
        assert_eq!(fresh.current_count, 1);
    }

    #[test]
    fn test_stale_tally_is_replaced_on_next_vote() {
        let votes = VoteCoordinator::default();
        let start = Utc::now();
        let key = (GUILD, VoteKind::Skip);

        votes.record_vote(key.clone(), 1, 3, start);
        votes.record_vote(key.clone(), 2, 3, start);

        let later = start + TimeDelta::minutes(6);
        let outcome = votes.record_vote(key, 1, 3, later);

        assert!(!outcome.already_voted);
        assert_eq!(outcome.current_count, 1);
    }

    #[test]
    fn test_custom_window() {
        let votes = VoteCoordinator::new(Duration::from_secs(30));
        let start = Utc::now();
        let key = (GUILD, VoteKind::Skip);

        votes.record_vote(key.clone(), 1, 3, start);
        let outcome = votes.record_vote(key, 2, 3, start + TimeDelta::seconds(20));

        assert_eq!(outcome.current_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_votes_resolve_once_per_quorum() {
        let votes = Arc::new(VoteCoordinator::default());

        let handles: Vec<_> = (0..50u64)
            .map(|user| {
                let votes = Arc::clone(&votes);
                tokio::spawn(async move { votes.cast_vote(GUILD, VoteKind::Skip, user, 10).await })
            })
            .collect();

        let outcomes = futures::future::join_all(handles).await;
        let resolved = outcomes
            .into_iter()
            .map(|outcome| outcome.unwrap())
            .filter(|outcome| outcome.threshold_met)
            .count();

        assert_eq!(resolved, 5);
        assert_eq!(votes.active_tallies(), 0);
    }
}
