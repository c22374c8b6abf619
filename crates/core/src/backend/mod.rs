//! Store backend integration.
//!
//! The backend owns the delivery queue. The bridge only ever:
//! - fetches the current batch of pending deliveries
//! - reports each delivery as completed or failed, exactly once
//!
//! Network problems never escape this module: a failed fetch is an empty
//! batch, a failed report is `false`.

mod http;
mod types;

pub use http::{HttpBackendClient, CONNECT_TIMEOUT, READ_TIMEOUT};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the store backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client not configured (missing URL, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// The remote side of a delivery: where pending work comes from and where
/// outcomes are reported.
#[async_trait]
pub trait DeliveryBackend: Send + Sync {
    /// Fetch the current batch of pending deliveries, in backend order.
    ///
    /// Any failure is logged and yields an empty batch.
    async fn fetch_pending(&self) -> Vec<PendingDelivery>;

    /// Mark a delivery as completed. Returns whether the backend acknowledged.
    async fn report_completed(&self, id: &str) -> bool;

    /// Mark a delivery as failed with a human-readable reason.
    /// Returns whether the backend acknowledged.
    async fn report_failed(&self, id: &str, reason: &str) -> bool;
}
