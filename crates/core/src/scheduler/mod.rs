//! Recurring polling schedule.
//!
//! Two states, stopped and running. While running, a timer task spawns one
//! polling cycle per tick on its own task so the timer never waits on the
//! network. Reload is stop followed by start with the new interval.

mod runner;
mod types;

pub use runner::{PollScheduler, DEFAULT_INITIAL_DELAY};
pub use types::{SchedulerError, SchedulerStatus};
