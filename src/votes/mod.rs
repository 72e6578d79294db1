//! Votes Module
//!
//! Per-guild vote collection toward a quorum ("skip", "previous", ...), with
//! duplicate suppression, a fixed voting window and per-tally locking.

mod coordinator;
mod tally;

#[cfg(test)]
mod property_tests;

use std::fmt;

use serde::Serialize;

pub use coordinator::{VoteCoordinator, DEFAULT_VOTE_WINDOW};
pub use tally::VoteTally;

/// Discord guild snowflake
pub type GuildId = u64;

/// Discord user snowflake
pub type UserId = u64;

// == Vote Kind ==
/// Discriminates independent tallies within one guild.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoteKind {
    Skip,
    Previous,
    Other(String),
}

impl VoteKind {
    pub fn as_str(&self) -> &str {
        match self {
            VoteKind::Skip => "skip",
            VoteKind::Previous => "previous",
            VoteKind::Other(name) => name,
        }
    }
}

impl From<&str> for VoteKind {
    fn from(name: &str) -> Self {
        match name {
            "skip" => VoteKind::Skip,
            "previous" => VoteKind::Previous,
            other => VoteKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Vote Outcome ==
/// Result of a single `cast_vote` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    /// The user had already voted in the open tally; nothing changed
    pub already_voted: bool,
    /// Votes in the tally after this call (including the resolving vote)
    pub current_count: usize,
    /// This vote reached the quorum and resolved the tally
    pub threshold_met: bool,
}
