//! Expiry Sweeper Task
//!
//! Background tasks that periodically drop expired cache entries, vote
//! tallies and idle track states.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::cache::Cache;
use crate::config::MAX_SWEEP_INTERVAL_SECS;
use crate::player::TrackStates;
use crate::votes::VoteCoordinator;

const MAX_PERIOD: Duration = Duration::from_secs(MAX_SWEEP_INTERVAL_SECS);

// == Sweep Trait ==
/// Something holding state that expires and must be cleaned out-of-band.
#[async_trait]
pub trait Sweep: Send + Sync + 'static {
    /// Name used in log lines
    fn name(&self) -> &'static str;

    /// Removes expired state and returns how many items were dropped.
    async fn sweep(&self) -> usize;
}

#[async_trait]
impl<T: Sweep + ?Sized> Sweep for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn sweep(&self) -> usize {
        (**self).sweep().await
    }
}

#[async_trait]
impl<V> Sweep for Cache<V>
where
    V: Clone + Send + 'static,
{
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn sweep(&self) -> usize {
        self.cleanup_expired().await
    }
}

#[async_trait]
impl Sweep for VoteCoordinator {
    fn name(&self) -> &'static str {
        "votes"
    }

    async fn sweep(&self) -> usize {
        self.sweep_expired(Utc::now()).await
    }
}

#[async_trait]
impl Sweep for TrackStates {
    fn name(&self) -> &'static str {
        "track_states"
    }

    async fn sweep(&self) -> usize {
        self.prune_idle(Utc::now())
    }
}

// == Spawn Sweeper ==
/// Spawns a task that sweeps `target` every `period`, first after one period.
///
/// Each sweep runs as its own task: if it panics the failure is logged and
/// the next tick sweeps again. The returned handle is aborted on shutdown.
///
/// # Example
/// ```ignore
/// let cache: Cache<String> = Cache::new(1000, Duration::from_secs(3600));
/// let handle = spawn_sweeper(cache.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweeper<S>(target: S, period: Duration) -> JoinHandle<()>
where
    S: Sweep + Clone,
{
    tokio::spawn(async move {
        let name = target.name();
        // Keeps the first deadline representable
        let period = period.min(MAX_PERIOD);
        info!(sweeper = name, period_secs = period.as_secs(), "starting expiry sweeper");

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let run = target.clone();
            match tokio::spawn(async move { run.sweep().await }).await {
                Ok(0) => debug!(sweeper = name, "nothing expired"),
                Ok(removed) => info!(sweeper = name, removed, "removed expired entries"),
                Err(err) => error!(sweeper = name, error = %err, "sweep failed"),
            }
        }
    })
}
