//! Track State Module
//!
//! Playback accounting per track: how long it actually played, how long it sat
//! paused, and where it was last seen.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

/// Default idle time after which a track's state is dropped
pub const DEFAULT_TRACK_IDLE: Duration = Duration::from_secs(30 * 60);

// == Track State ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackState {
    /// Player position reported at the last update
    pub last_position: Duration,
    /// Wall time of the last update
    pub last_update: DateTime<Utc>,
    /// Time spent paused between updates
    pub pause_duration: Duration,
    /// Time spent playing between updates
    pub total_played: Duration,
}

impl TrackState {
    fn new(position: Duration, now: DateTime<Utc>) -> Self {
        Self {
            last_position: position,
            last_update: now,
            pause_duration: Duration::ZERO,
            total_played: Duration::ZERO,
        }
    }
}

// == Track States ==
/// Track identifier -> [`TrackState`], updated on every player interaction.
#[derive(Debug)]
pub struct TrackStates {
    states: DashMap<String, TrackState>,
    max_idle: Duration,
}

impl Default for TrackStates {
    fn default() -> Self {
        Self::new(DEFAULT_TRACK_IDLE)
    }
}

impl TrackStates {
    pub fn new(max_idle: Duration) -> Self {
        Self {
            states: DashMap::new(),
            max_idle,
        }
    }

    pub fn max_idle(&self) -> Duration {
        self.max_idle
    }

    // == Update ==
    /// Records the player's `position` for `track_id`.
    ///
    /// Time since the previous update is credited to `total_played`, or to
    /// `pause_duration` when `paused` is set.
    pub fn update(&self, track_id: &str, position: Duration, paused: bool) -> TrackState {
        self.update_at(track_id, position, paused, Utc::now())
    }

    fn update_at(
        &self,
        track_id: &str,
        position: Duration,
        paused: bool,
        now: DateTime<Utc>,
    ) -> TrackState {
        let mut state = self
            .states
            .entry(track_id.to_string())
            .or_insert_with(|| TrackState::new(position, now));

        // Clock steps backwards count as no time passing
        let elapsed = (now - state.last_update).to_std().unwrap_or(Duration::ZERO);
        if paused {
            state.pause_duration += elapsed;
        } else {
            state.total_played += elapsed;
        }
        state.last_position = position;
        state.last_update = now;

        state.value().clone()
    }

    pub fn get(&self, track_id: &str) -> Option<TrackState> {
        self.states.get(track_id).map(|state| state.value().clone())
    }

    pub fn remove(&self, track_id: &str) -> Option<TrackState> {
        self.states.remove(track_id).map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    // == Prune Idle ==
    /// Drops states not updated within `max_idle` of `now`.
    pub fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.states.retain(|track_id, state| {
            let idle = (now - state.last_update).to_std().unwrap_or(Duration::ZERO);
            let keep = idle <= self.max_idle;
            if !keep {
                debug!(track_id = %track_id, "dropping idle track state");
                removed += 1;
            }
            keep
        });
        removed
    }
}
