//! End-to-end delivery cycles: real HTTP client, mock store, mock executor.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::MockStore;
use rankdelivery_core::testing::MockExecutor;
use rankdelivery_core::{
    create_dispatch_context, load_config_from_str, Config, DeliveryBackend, DeliveryBridge,
    DeliveryProcessor, HttpBackendClient,
};

struct Harness {
    store: MockStore,
    executor: MockExecutor,
    bridge: DeliveryBridge,
}

fn config(url: &str, enabled: bool, interval: u64) -> Config {
    load_config_from_str(&format!(
        r#"
[api]
url = "{url}"
key = "test-key"

[polling]
enabled = {enabled}
interval = {interval}

[commands]
vip = ["lp user {{username}} parent add vip", "broadcast {{username}} is now VIP on {{platform}}"]
empty = []
"#
    ))
    .unwrap()
}

async fn harness(enabled: bool, interval: u64) -> Harness {
    let store = MockStore::start().await;
    let config = config(&store.url(), enabled, interval);

    let backend = Arc::new(HttpBackendClient::new(&config.api).unwrap());
    let executor = MockExecutor::new();
    let (dispatcher, worker) = create_dispatch_context(Box::new(executor.clone()), 16);
    tokio::spawn(worker.run());

    let processor = Arc::new(DeliveryProcessor::from_config(
        &config,
        backend as Arc<dyn DeliveryBackend>,
        dispatcher,
    ));
    let bridge = DeliveryBridge::new(config, processor).with_initial_delay(Duration::ZERO);

    Harness {
        store,
        executor,
        bridge,
    }
}

#[tokio::test]
async fn test_manual_poll_delivers_and_reports() {
    let h = harness(false, 60).await;
    h.store
        .set_pending(&[
            ("a1", "Alice", "java", "vip"),
            ("b2", "Bob", "java", "gold"),
            ("c3", "Carol", "bedrock", "empty"),
        ])
        .await;

    let report = h.bridge.poll().await.unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.unacknowledged, 0);
    assert_eq!(
        h.executor.executed().await,
        vec![
            "lp user Alice parent add vip",
            "broadcast Alice is now VIP on java"
        ]
    );

    let complete = h.store.requests_to("/api/plugin/complete").await;
    assert_eq!(complete.len(), 1);
    assert_eq!(complete[0].body, Some(json!({"id": "a1"})));

    let failed = h.store.requests_to("/api/plugin/failed").await;
    assert_eq!(failed.len(), 2);
    assert_eq!(
        failed[0].body,
        Some(json!({"id": "b2", "error": "No commands configured for package: gold"}))
    );
    assert_eq!(
        failed[1].body,
        Some(json!({"id": "c3", "error": "No commands configured for package: empty"}))
    );
}

#[tokio::test]
async fn test_failed_command_reports_reason() {
    let h = harness(false, 60).await;
    h.executor
        .fail_on("broadcast Alice is now VIP on java")
        .await;
    h.store.set_pending(&[("a1", "Alice", "java", "vip")]).await;

    let report = h.bridge.poll().await.unwrap();
    assert_eq!(report.failed, 1);

    let failed = h.store.requests_to("/api/plugin/failed").await;
    let error = failed[0].body.as_ref().unwrap()["error"].as_str().unwrap();
    assert!(error.starts_with("Failed to execute command 'broadcast Alice is now VIP on java'"));
    assert!(h.store.requests_to("/api/plugin/complete").await.is_empty());
}

#[tokio::test]
async fn test_unacknowledged_delivery_is_redelivered_next_cycle() {
    let h = harness(false, 60).await;
    h.store.set_pending(&[("a1", "Alice", "java", "vip")]).await;
    h.store.fail_reports_with(StatusCode::INTERNAL_SERVER_ERROR).await;

    let first = h.bridge.poll().await.unwrap();
    assert_eq!(first.unacknowledged, 1);

    // The backend still lists it, so the next cycle runs it again.
    let second = h.bridge.poll().await.unwrap();
    assert_eq!(second.fetched, 1);
    assert_eq!(h.executor.execute_count().await, 4);
}

#[tokio::test]
async fn test_backend_error_skips_cycle() {
    let h = harness(false, 60).await;
    h.store.set_pending(&[("a1", "Alice", "java", "vip")]).await;
    h.store
        .fail_pending_with(StatusCode::INTERNAL_SERVER_ERROR)
        .await;

    let report = h.bridge.poll().await.unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(h.executor.execute_count().await, 0);
    assert_eq!(h.store.requests().await.len(), 1);
}

#[tokio::test]
async fn test_scheduled_polling_runs_cycles() {
    let h = harness(true, 1).await;
    h.store.set_pending(&[("a1", "Alice", "java", "vip")]).await;

    h.bridge.enable().await.unwrap();

    let mut last_cycle = None;
    for _ in 0..100 {
        last_cycle = h.bridge.status().await.scheduler.last_cycle;
        if last_cycle.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    h.bridge.disable().await;

    let last_cycle = last_cycle.expect("scheduled cycle did not run");
    assert_eq!(last_cycle.completed, 1);
    assert!(!h.bridge.scheduler().is_running().await);
    assert_eq!(h.store.requests_to("/api/plugin/complete").await.len(), 1);
}
