//! Types for the polling scheduler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::processor::CycleReport;

/// Errors that can occur when starting the schedule.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Interval must be at least one second.
    #[error("invalid polling interval: {0} seconds")]
    InvalidInterval(u64),
}

/// Current status of the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the recurring trigger is active.
    pub running: bool,
    /// Active interval in seconds (None when stopped).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    /// Most recent cycle that actually ran (scheduled or manual).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<CycleReport>,
}
