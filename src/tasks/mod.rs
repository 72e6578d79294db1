//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweepers: periodically drop expired cache entries, vote tallies
//!   and idle track states
//! - Timed tasks: restartable one-shot delayed jobs

mod cleanup;
mod timed;

pub use cleanup::{spawn_sweeper, Sweep};
pub use timed::TimedTask;
