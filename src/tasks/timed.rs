//! Timed Task
//!
//! A restartable one-shot job that runs after a fixed delay, e.g. leaving an
//! idle voice channel.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

// == Timed Task ==
/// Runs a job once after `wait`, unless cancelled or restarted first.
///
/// Dropping the `TimedTask` cancels a pending run.
#[derive(Debug)]
pub struct TimedTask {
    wait: Duration,
    handle: Option<JoinHandle<()>>,
}

impl TimedTask {
    pub fn new(wait: Duration) -> Self {
        Self { wait, handle: None }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    // == Start ==
    /// Schedules `job` to run after the delay, cancelling any pending run.
    pub fn start<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let wait = self.wait;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            job.await;
        }));
    }

    // == Cancel ==
    /// Cancels a pending run. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TimedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
