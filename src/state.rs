//! Application State
//!
//! The single set of shared structures a bot process hands to its command and
//! event handlers.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::cache::Cache;
use crate::config::Config;
use crate::player::TrackStates;
use crate::tasks::spawn_sweeper;
use crate::votes::VoteCoordinator;

// == App State ==
/// Shared handles to the cache, vote coordinator and track states.
///
/// Built once at startup and cloned into every handler. Cached values are the
/// JSON payloads returned by the search and metadata APIs.
#[derive(Clone)]
pub struct AppState {
    pub cache: Cache<Value>,
    pub votes: Arc<VoteCoordinator>,
    pub tracks: Arc<TrackStates>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache: Cache::new(config.cache_max_entries, config.cache_default_ttl()),
            votes: Arc::new(VoteCoordinator::new(config.vote_window())),
            tracks: Arc::new(TrackStates::new(config.track_state_idle())),
        }
    }

    /// Starts one expiry sweeper per structure. Abort the handles on shutdown.
    ///
    /// Track states are pruned on the vote sweep cadence.
    pub fn spawn_sweepers(&self, config: &Config) -> Vec<JoinHandle<()>> {
        vec![
            spawn_sweeper(self.cache.clone(), config.cache_cleanup_interval()),
            spawn_sweeper(Arc::clone(&self.votes), config.vote_sweep_interval()),
            spawn_sweeper(Arc::clone(&self.tracks), config.vote_sweep_interval()),
        ]
    }
}
