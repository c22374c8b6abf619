//! Mock store backend for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::{DeliveryBackend, PendingDelivery};
use crate::processor::DeliveryOutcome;

/// A report call received by the mock, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedReport {
    /// Delivery id that was reported.
    pub id: String,
    /// Reported outcome; `Failed` carries the error text sent.
    pub outcome: DeliveryOutcome,
}

/// Mock implementation of the `DeliveryBackend` trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable pending batch
/// - Record every report call in order
/// - Simulate an unreachable backend or unacknowledged reports
///
/// Acknowledged deliveries are removed from the pending batch, like the real
/// backend does.
///
/// # Example
///
/// ```rust,ignore
/// use rankdelivery_core::testing::{fixtures, MockBackend};
///
/// let backend = MockBackend::new();
/// backend.set_pending(vec![fixtures::delivery("d1", "Alice", "java", "vip")]).await;
///
/// // Run a cycle...
///
/// let reports = backend.reports().await;
/// assert_eq!(reports[0].id, "d1");
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Deliveries returned by `fetch_pending`.
    pending: Arc<RwLock<Vec<PendingDelivery>>>,
    /// Recorded report calls.
    reports: Arc<RwLock<Vec<RecordedReport>>>,
    /// Number of fetch calls.
    fetches: Arc<RwLock<usize>>,
    /// Whether report calls are acknowledged.
    acknowledge: Arc<RwLock<bool>>,
    /// Whether fetches fail (return an empty batch).
    unreachable: Arc<RwLock<bool>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend with an empty batch.
    pub fn new() -> Self {
        Self {
            pending: Arc::new(RwLock::new(Vec::new())),
            reports: Arc::new(RwLock::new(Vec::new())),
            fetches: Arc::new(RwLock::new(0)),
            acknowledge: Arc::new(RwLock::new(true)),
            unreachable: Arc::new(RwLock::new(false)),
        }
    }

    /// Replace the pending batch.
    pub async fn set_pending(&self, deliveries: Vec<PendingDelivery>) {
        *self.pending.write().await = deliveries;
    }

    /// Deliveries still pending.
    pub async fn pending(&self) -> Vec<PendingDelivery> {
        self.pending.read().await.clone()
    }

    /// Whether report calls return success.
    pub async fn set_acknowledge(&self, acknowledge: bool) {
        *self.acknowledge.write().await = acknowledge;
    }

    /// Simulate a backend that cannot be reached.
    pub async fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.write().await = unreachable;
    }

    /// All report calls, in the order they were made.
    pub async fn reports(&self) -> Vec<RecordedReport> {
        self.reports.read().await.clone()
    }

    /// Number of times `fetch_pending` was called.
    pub async fn fetch_count(&self) -> usize {
        *self.fetches.read().await
    }

    async fn record(&self, id: &str, outcome: DeliveryOutcome) -> bool {
        self.reports.write().await.push(RecordedReport {
            id: id.to_string(),
            outcome,
        });

        let acknowledged = *self.acknowledge.read().await;
        if acknowledged {
            self.pending.write().await.retain(|d| d.id != id);
        }
        acknowledged
    }
}

#[async_trait]
impl DeliveryBackend for MockBackend {
    async fn fetch_pending(&self) -> Vec<PendingDelivery> {
        *self.fetches.write().await += 1;
        if *self.unreachable.read().await {
            return Vec::new();
        }
        self.pending.read().await.clone()
    }

    async fn report_completed(&self, id: &str) -> bool {
        self.record(id, DeliveryOutcome::Completed).await
    }

    async fn report_failed(&self, id: &str, error: &str) -> bool {
        self.record(
            id,
            DeliveryOutcome::Failed {
                reason: error.to_string(),
            },
        )
        .await
    }
}
