//! Polling scheduler implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::processor::{CycleReport, DeliveryProcessor};

use super::types::{SchedulerError, SchedulerStatus};

/// Delay before the first scheduled cycle after `start`.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(5);

/// A running schedule. Dropping `shutdown_tx` also ends the timer task.
struct RunningSchedule {
    interval: Duration,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

enum SchedulerState {
    Stopped,
    Running(RunningSchedule),
}

/// Owns the recurring trigger that runs polling cycles.
pub struct PollScheduler {
    processor: Arc<DeliveryProcessor>,
    initial_delay: Duration,
    state: Mutex<SchedulerState>,
    last_cycle: Arc<RwLock<Option<CycleReport>>>,
}

impl PollScheduler {
    /// Create a stopped scheduler.
    pub fn new(processor: Arc<DeliveryProcessor>) -> Self {
        Self {
            processor,
            initial_delay: DEFAULT_INITIAL_DELAY,
            state: Mutex::new(SchedulerState::Stopped),
            last_cycle: Arc::new(RwLock::new(None)),
        }
    }

    /// Override the delay before the first scheduled cycle.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Start polling every `interval`. No-op if already running.
    pub async fn start(&self, interval: Duration) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(interval.as_secs()));
        }

        let mut state = self.state.lock().await;
        if let SchedulerState::Running(running) = &*state {
            debug!(
                interval_secs = running.interval.as_secs(),
                "Polling already running"
            );
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_schedule(
            Arc::clone(&self.processor),
            Arc::clone(&self.last_cycle),
            self.initial_delay,
            interval,
            shutdown_rx,
        ));

        *state = SchedulerState::Running(RunningSchedule {
            interval,
            shutdown_tx,
            handle,
        });
        info!("Started polling every {} seconds", interval.as_secs());
        Ok(())
    }

    /// Cancel the recurring trigger. No-op if already stopped.
    ///
    /// A cycle that has already started keeps running to completion.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if let SchedulerState::Running(running) =
            std::mem::replace(&mut *state, SchedulerState::Stopped)
        {
            let _ = running.shutdown_tx.send(());
            let _ = running.handle.await;
            info!("Stopped polling task");
        }
    }

    /// Stop, then start again with a (possibly new) interval.
    pub async fn restart(&self, interval: Duration) -> Result<(), SchedulerError> {
        self.stop().await;
        self.start(interval).await
    }

    /// Run one cycle now, outside the schedule, regardless of state.
    pub fn manual_trigger(&self) -> JoinHandle<CycleReport> {
        spawn_cycle(&self.processor, &self.last_cycle)
    }

    pub async fn is_running(&self) -> bool {
        matches!(&*self.state.lock().await, SchedulerState::Running(_))
    }

    /// Get current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        let interval_secs = match &*self.state.lock().await {
            SchedulerState::Running(running) => Some(running.interval.as_secs()),
            SchedulerState::Stopped => None,
        };

        SchedulerStatus {
            running: interval_secs.is_some(),
            interval_secs,
            last_cycle: self.last_cycle.read().await.clone(),
        }
    }
}

async fn run_schedule(
    processor: Arc<DeliveryProcessor>,
    last_cycle: Arc<RwLock<Option<CycleReport>>>,
    initial_delay: Duration,
    interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + initial_delay, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!("Polling schedule received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                spawn_cycle(&processor, &last_cycle);
            }
        }
    }
}

fn spawn_cycle(
    processor: &Arc<DeliveryProcessor>,
    last_cycle: &Arc<RwLock<Option<CycleReport>>>,
) -> JoinHandle<CycleReport> {
    let processor = Arc::clone(processor);
    let last_cycle = Arc::clone(last_cycle);

    tokio::spawn(async move {
        let report = processor.process_pending().await;
        if !report.skipped {
            *last_cycle.write().await = Some(report.clone());
        }
        report
    })
}
