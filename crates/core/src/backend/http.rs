//! HTTP client for the store backend's plugin API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;

use super::{
    BackendError, CompleteRequest, DeliveryBackend, FailedRequest, PendingDelivery,
    PendingResponse,
};

/// Deadline for establishing a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for each read on an established connection.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

const API_KEY_HEADER: &str = "X-API-Key";
const PENDING_PATH: &str = "/api/plugin/pending";
const COMPLETE_PATH: &str = "/api/plugin/complete";
const FAILED_PATH: &str = "/api/plugin/failed";

/// Store backend client authenticated with a static API key.
pub struct HttpBackendClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpBackendClient {
    /// Create a new client. A trailing slash on the URL is dropped here, once.
    pub fn new(config: &ApiConfig) -> Result<Self, BackendError> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BackendError::NotConfigured(
                "api.url is required".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: config.key.clone(),
        })
    }

    /// Normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, &self.api_key)
    }

    /// Fetch pending deliveries, surfacing every failure.
    pub async fn try_fetch_pending(&self) -> Result<Vec<PendingDelivery>, BackendError> {
        let response = self
            .authorized(self.client.get(self.url(PENDING_PATH)))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let parsed: PendingResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))?;

        debug!(count = parsed.commands.len(), "Fetched pending deliveries");
        Ok(parsed.commands)
    }

    /// Mark a delivery as completed, surfacing every failure.
    pub async fn try_report_completed(&self, id: &str) -> Result<(), BackendError> {
        self.post(COMPLETE_PATH, &CompleteRequest { id }).await
    }

    /// Mark a delivery as failed, surfacing every failure.
    pub async fn try_report_failed(&self, id: &str, reason: &str) -> Result<(), BackendError> {
        self.post(FAILED_PATH, &FailedRequest { id, error: reason })
            .await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), BackendError> {
        let response = self
            .authorized(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl DeliveryBackend for HttpBackendClient {
    async fn fetch_pending(&self) -> Vec<PendingDelivery> {
        match self.try_fetch_pending().await {
            Ok(deliveries) => deliveries,
            Err(BackendError::Status { status, .. }) => {
                warn!(status, "Failed to fetch pending deliveries");
                Vec::new()
            }
            Err(e) => {
                error!("Error fetching pending deliveries: {}", e);
                Vec::new()
            }
        }
    }

    async fn report_completed(&self, id: &str) -> bool {
        match self.try_report_completed(id).await {
            Ok(()) => {
                info!(delivery_id = id, "Marked delivery as completed");
                true
            }
            Err(BackendError::Status { status, .. }) => {
                warn!(
                    delivery_id = id,
                    status, "Failed to mark delivery as completed"
                );
                false
            }
            Err(e) => {
                error!(
                    delivery_id = id,
                    "Error marking delivery as completed: {}", e
                );
                false
            }
        }
    }

    async fn report_failed(&self, id: &str, reason: &str) -> bool {
        match self.try_report_failed(id, reason).await {
            Ok(()) => {
                warn!(delivery_id = id, reason, "Marked delivery as failed");
                true
            }
            Err(BackendError::Status { status, .. }) => {
                warn!(delivery_id = id, status, "Failed to mark delivery as failed");
                false
            }
            Err(e) => {
                error!(delivery_id = id, "Error marking delivery as failed: {}", e);
                false
            }
        }
    }
}
