//! Playback Core - caching and vote coordination for a Discord music bot
//!
//! Provides a TTL/LRU cache with read-through fetching, per-guild skip and
//! previous voting, and the background sweepers that keep both bounded.

pub mod cache;
pub mod config;
pub mod error;
pub mod player;
pub mod state;
pub mod tasks;
pub mod votes;

pub use cache::Cache;
pub use config::Config;
pub use error::{Error, FetchError};
pub use state::AppState;
pub use tasks::spawn_sweeper;
pub use votes::{VoteCoordinator, VoteKind, VoteOutcome};
