//! Player Module
//!
//! Per-track state kept alongside playback controls.

mod state;

pub use state::{TrackState, TrackStates, DEFAULT_TRACK_IDLE};
