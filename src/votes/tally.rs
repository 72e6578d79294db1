//! Vote Tally Module
//!
//! The set of users who voted for one (guild, kind) pair and its voting window.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};

use crate::votes::UserId;

// == Vote Tally ==
#[derive(Debug, Clone)]
pub struct VoteTally {
    voters: HashSet<UserId>,
    opened_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl VoteTally {
    // == Constructor ==
    /// Opens an empty tally at `now` that stays open for `window`.
    pub fn open(now: DateTime<Utc>, window: TimeDelta) -> Self {
        Self {
            voters: HashSet::new(),
            opened_at: now,
            expires_at: now
                .checked_add_signed(window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    // == Add ==
    /// Records a vote. Returns false if the user had already voted.
    pub fn add(&mut self, user_id: UserId) -> bool {
        self.voters.insert(user_id)
    }

    pub fn count(&self) -> usize {
        self.voters.len()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    // == Is Expired ==
    /// A tally is expired once its window end lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
