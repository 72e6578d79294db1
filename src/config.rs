//! Configuration Module
//!
//! Loads cache, vote and sweeper settings from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Longest accepted sweep interval, in seconds (one year)
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub cache_max_entries: usize,
    /// Default TTL in seconds for cached values
    pub cache_default_ttl: u64,
    /// Seconds between cache expiry sweeps
    pub cache_cleanup_interval: u64,
    /// Seconds a vote tally stays open after its first vote
    pub vote_window: u64,
    /// Seconds between vote expiry sweeps
    pub vote_sweep_interval: u64,
    /// Seconds without updates before a track state is dropped
    pub track_state_idle: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `CACHE_CLEANUP_INTERVAL` - Cache sweep frequency in seconds (default: 300)
    /// - `VOTE_WINDOW` - Vote expiry in seconds (default: 300)
    /// - `VOTE_SWEEP_INTERVAL` - Vote sweep frequency in seconds (default: 300)
    /// - `TRACK_STATE_IDLE` - Track state idle limit in seconds (default: 1800)
    ///
    /// Missing or unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_default_ttl: env_or("CACHE_DEFAULT_TTL", defaults.cache_default_ttl),
            cache_cleanup_interval: env_or("CACHE_CLEANUP_INTERVAL", defaults.cache_cleanup_interval),
            vote_window: env_or("VOTE_WINDOW", defaults.vote_window),
            vote_sweep_interval: env_or("VOTE_SWEEP_INTERVAL", defaults.vote_sweep_interval),
            track_state_idle: env_or("TRACK_STATE_IDLE", defaults.track_state_idle),
        }
    }

    /// Rejects settings the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_cleanup_interval == 0 {
            return Err(Error::InvalidConfig(
                "CACHE_CLEANUP_INTERVAL must be greater than 0".to_string(),
            ));
        }
        if self.vote_sweep_interval == 0 {
            return Err(Error::InvalidConfig(
                "VOTE_SWEEP_INTERVAL must be greater than 0".to_string(),
            ));
        }
        for (name, secs) in [
            ("CACHE_CLEANUP_INTERVAL", self.cache_cleanup_interval),
            ("VOTE_SWEEP_INTERVAL", self.vote_sweep_interval),
        ] {
            if secs > MAX_SWEEP_INTERVAL_SECS {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be at most {MAX_SWEEP_INTERVAL_SECS} seconds"
                )));
            }
        }
        Ok(())
    }

    pub fn cache_default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_default_ttl)
    }

    pub fn cache_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cache_cleanup_interval)
    }

    pub fn vote_window(&self) -> Duration {
        Duration::from_secs(self.vote_window)
    }

    pub fn vote_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.vote_sweep_interval)
    }

    pub fn track_state_idle(&self) -> Duration {
        Duration::from_secs(self.track_state_idle)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_max_entries: 1000,
            cache_default_ttl: 3600,
            cache_cleanup_interval: 300,
            vote_window: 300,
            vote_sweep_interval: 300,
            track_state_idle: 1800,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.vote_window(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        // Only this test touches these variables
        env::set_var("VOTE_WINDOW", "120");
        env::set_var("TRACK_STATE_IDLE", "not-a-number");

        let config = Config::from_env();
        assert_eq!(config.vote_window, 120);
        assert_eq!(config.track_state_idle, 1800);

        env::remove_var("VOTE_WINDOW");
        env::remove_var("TRACK_STATE_IDLE");
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let config = Config {
            vote_sweep_interval: 0,
            ..Config::default()
        };

        assert_eq!(
            config.validate(),
            Err(Error::InvalidConfig(
                "VOTE_SWEEP_INTERVAL must be greater than 0".to_string()
            ))
        );
    }

    #[test]
    fn test_oversized_intervals_rejected() {
        let config = Config {
            cache_cleanup_interval: u64::MAX,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(Error::InvalidConfig(format!(
                "CACHE_CLEANUP_INTERVAL must be at most {MAX_SWEEP_INTERVAL_SECS} seconds"
            )))
        );

        let at_limit = Config {
            vote_sweep_interval: MAX_SWEEP_INTERVAL_SECS,
            ..Config::default()
        };
        assert!(at_limit.validate().is_ok());
    }
}
