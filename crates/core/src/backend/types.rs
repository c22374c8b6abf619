//! Wire types for the store backend API.

use serde::{Deserialize, Serialize};

/// One fulfillment unit received from the backend.
///
/// Never mutated locally; dropped once its outcome has been reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelivery {
    /// Opaque backend identifier, echoed back in report calls.
    pub id: String,
    /// Player that receives the package.
    pub username: String,
    /// Where the order came from (e.g., "java", "bedrock").
    pub platform: String,
    /// Key into the configured command lists.
    pub package: String,
}

/// Response body of `GET /api/plugin/pending`.
///
/// The backend also sends `success`, `count` and per-item `createdAt`; those
/// are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingResponse {
    pub commands: Vec<PendingDelivery>,
}

/// Request body of `POST /api/plugin/complete`.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteRequest<'a> {
    pub id: &'a str,
}

/// Request body of `POST /api/plugin/failed`.
#[derive(Debug, Clone, Serialize)]
pub struct FailedRequest<'a> {
    pub id: &'a str,
    pub error: &'a str,
}
