//! In-process mock of the store backend's plugin API.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// A request received by the mock backend.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Inner {
    pending: Vec<Value>,
    pending_status: Option<StatusCode>,
    report_status: Option<StatusCode>,
    requests: Vec<ReceivedRequest>,
}

/// Running mock backend bound to an ephemeral local port.
#[derive(Clone)]
pub struct MockStore {
    pub addr: SocketAddr,
    inner: Arc<Mutex<Inner>>,
}

impl MockStore {
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(Inner::default()));

        let app = Router::new()
            .route("/api/plugin/pending", get(pending))
            .route("/api/plugin/complete", post(complete))
            .route("/api/plugin/failed", post(failed))
            .with_state(Arc::clone(&inner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, inner }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue deliveries as `(id, username, platform, package)`.
    pub async fn set_pending(&self, deliveries: &[(&str, &str, &str, &str)]) {
        self.inner.lock().await.pending = deliveries
            .iter()
            .map(|(id, username, platform, package)| {
                json!({
                    "id": id,
                    "username": username,
                    "platform": platform,
                    "package": package,
                    "createdAt": "2024-01-01T00:00:00.000Z",
                })
            })
            .collect();
    }

    /// Answer the pending endpoint with this status and an error body.
    pub async fn fail_pending_with(&self, status: StatusCode) {
        self.inner.lock().await.pending_status = Some(status);
    }

    /// Answer both report endpoints with this status.
    pub async fn fail_reports_with(&self, status: StatusCode) {
        self.inner.lock().await.report_status = Some(status);
    }

    pub async fn requests(&self) -> Vec<ReceivedRequest> {
        self.inner.lock().await.requests.clone()
    }

    /// Requests made to one path.
    pub async fn requests_to(&self, path: &str) -> Vec<ReceivedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

fn api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn pending(
    State(inner): State<Arc<Mutex<Inner>>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut inner = inner.lock().await;
    inner.requests.push(ReceivedRequest {
        path: "/api/plugin/pending".to_string(),
        api_key: api_key(&headers),
        body: None,
    });

    if let Some(status) = inner.pending_status {
        return (status, Json(json!({"error": "Internal server error"})));
    }

    let commands = inner.pending.clone();
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": commands.len(),
            "commands": commands,
        })),
    )
}

async fn record_report(
    inner: &Mutex<Inner>,
    path: &str,
    headers: &HeaderMap,
    body: Value,
) -> (StatusCode, Json<Value>) {
    let mut inner = inner.lock().await;
    let id = body.get("id").and_then(Value::as_str).map(str::to_string);
    inner.requests.push(ReceivedRequest {
        path: path.to_string(),
        api_key: api_key(headers),
        body: Some(body),
    });

    if let Some(status) = inner.report_status {
        return (status, Json(json!({"error": "Internal server error"})));
    }

    if let Some(id) = id {
        inner
            .pending
            .retain(|d| d.get("id").and_then(Value::as_str) != Some(id.as_str()));
    }
    (StatusCode::OK, Json(json!({"success": true})))
}

async fn complete(
    State(inner): State<Arc<Mutex<Inner>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_report(&inner, "/api/plugin/complete", &headers, body).await
}

async fn failed(
    State(inner): State<Arc<Mutex<Inner>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_report(&inner, "/api/plugin/failed", &headers, body).await
}
