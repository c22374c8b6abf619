//! Delivery processor: turns pending deliveries into server commands and
//! reports each outcome back to the backend.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::backend::{DeliveryBackend, PendingDelivery};
use crate::config::Config;
use crate::executor::{panic_message, ActionDispatcher};

use super::types::{
    delivery_message, no_actions_reason, render_action, ActionCatalog, CycleReport,
    DeliveryOutcome, DeliveryReport,
};

/// Clears the in-flight flag when a cycle ends, even by panic.
struct CycleGuard<'a>(&'a AtomicBool);

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives each pending delivery to exactly one terminal report.
pub struct DeliveryProcessor {
    backend: Arc<dyn DeliveryBackend>,
    dispatcher: ActionDispatcher,
    catalog: RwLock<ActionCatalog>,
    debug: AtomicBool,
    in_flight: AtomicBool,
}

impl DeliveryProcessor {
    /// Create a new processor.
    pub fn new(
        backend: Arc<dyn DeliveryBackend>,
        dispatcher: ActionDispatcher,
        catalog: ActionCatalog,
    ) -> Self {
        Self {
            backend,
            dispatcher,
            catalog: RwLock::new(catalog),
            debug: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Create a processor from loaded configuration.
    pub fn from_config(
        config: &Config,
        backend: Arc<dyn DeliveryBackend>,
        dispatcher: ActionDispatcher,
    ) -> Self {
        Self::new(backend, dispatcher, ActionCatalog::from_config(config)).with_debug(config.debug)
    }

    /// Enable verbose cycle logging.
    pub fn with_debug(self, debug: bool) -> Self {
        self.debug.store(debug, Ordering::Relaxed);
        self
    }

    /// Pick up new command lists and the debug flag. Takes effect from the
    /// next delivery.
    pub async fn reload(&self, config: &Config) {
        let catalog = ActionCatalog::from_config(config);
        info!(packages = catalog.len(), "Reloaded command configuration");
        *self.catalog.write().await = catalog;
        self.debug.store(config.debug, Ordering::Relaxed);
    }

    /// Whether a polling cycle is currently running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn verbose(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Run one polling cycle: fetch the batch and process every delivery in
    /// backend order.
    ///
    /// Only one cycle runs at a time; a call made while another cycle is in
    /// flight returns immediately with a skipped report.
    pub async fn process_pending(&self) -> CycleReport {
        let Some(_guard) = CycleGuard::acquire(&self.in_flight) else {
            info!("Previous polling cycle still running, skipping");
            return CycleReport::skipped();
        };

        if self.verbose() {
            info!("Polling for pending deliveries...");
        }

        let mut report = CycleReport::begin();
        let deliveries = self.backend.fetch_pending().await;
        report.fetched = deliveries.len();

        if deliveries.is_empty() {
            if self.verbose() {
                info!("No pending deliveries found");
            }
            return report.finish();
        }

        info!(count = deliveries.len(), "Processing pending deliveries");

        for delivery in &deliveries {
            let delivery_report = self.process_one(delivery).await;
            report.record(&delivery_report);
        }

        let report = report.finish();
        info!(
            completed = report.completed,
            failed = report.failed,
            unacknowledged = report.unacknowledged,
            "Polling cycle finished"
        );
        report
    }

    /// Process a single delivery and report its outcome exactly once.
    pub async fn process_one(&self, delivery: &PendingDelivery) -> DeliveryReport {
        let outcome = contain_panic(&delivery.id, self.deliver(delivery)).await;

        let acknowledged = match &outcome {
            DeliveryOutcome::Completed => {
                let acknowledged = self.backend.report_completed(&delivery.id).await;
                info!(
                    "Successfully delivered {} to {}",
                    delivery.package, delivery.username
                );
                self.notify_player(delivery).await;
                acknowledged
            }
            DeliveryOutcome::Failed { reason } => {
                self.backend.report_failed(&delivery.id, reason).await
            }
        };

        DeliveryReport {
            delivery_id: delivery.id.clone(),
            package: delivery.package.clone(),
            outcome,
            acknowledged,
        }
    }

    async fn deliver(&self, delivery: &PendingDelivery) -> DeliveryOutcome {
        let commands: Vec<String> = {
            let catalog = self.catalog.read().await;
            match catalog.actions_for(&delivery.package) {
                Some(templates) => templates
                    .iter()
                    .map(|template| render_action(template, delivery))
                    .collect(),
                None => {
                    let reason = no_actions_reason(&delivery.package);
                    warn!(delivery_id = %delivery.id, "{}", reason);
                    return DeliveryOutcome::Failed { reason };
                }
            }
        };

        info!(
            delivery_id = %delivery.id,
            package = %delivery.package,
            "Executing delivery for {}",
            delivery.username
        );
        if self.verbose() {
            for command in &commands {
                info!("Executing: {}", command);
            }
        }

        match self.dispatcher.run(commands).await {
            Ok(()) => DeliveryOutcome::Completed,
            Err(e) => DeliveryOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    async fn notify_player(&self, delivery: &PendingDelivery) {
        let reached = self
            .dispatcher
            .notify(&delivery.username, delivery_message(&delivery.package))
            .await;
        debug!(username = %delivery.username, reached, "Player notification");
    }
}

/// Per-delivery boundary: a panic while delivering becomes a failed outcome
/// carrying the panic message.
async fn contain_panic<F>(delivery_id: &str, delivery: F) -> DeliveryOutcome
where
    F: Future<Output = DeliveryOutcome>,
{
    AssertUnwindSafe(delivery)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(delivery_id, "Error processing delivery: {}", message);
            DeliveryOutcome::Failed {
                reason: format!("Unexpected error while processing delivery: {}", message),
            }
        })
}
