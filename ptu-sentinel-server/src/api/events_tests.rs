#![allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "test assertions")]

use super::*;
use async_trait::async_trait;
use axum_test::TestServer;
use ptu_sentinel_core::{BufferSink, Capabilities, DeploymentLister, ReservationLister};
use ptu_sentinel_types::{
    AccountLocator, DeploymentEntry, ReservationEntry, ReservationScope, ScanError, SentinelConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::router::build_router;

const SUBJECT: &str = "/subscriptions/sub-1/resourceGroups/rg-ai/providers/Microsoft.CognitiveServices/accounts/aoai/deployments/gpt4-ptu";

struct FakeDeployments(Result<Vec<DeploymentEntry>, ScanError>);

#[async_trait]
impl DeploymentLister for FakeDeployments {
    async fn list_deployments(
        &self,
        _account: &AccountLocator,
    ) -> Result<Vec<DeploymentEntry>, ScanError> {
        self.0.clone()
    }
}

struct FakeReservations(u64);

#[async_trait]
impl ReservationLister for FakeReservations {
    async fn list_reservations(
        &self,
        _scope: &ReservationScope,
    ) -> Result<Vec<ReservationEntry>, ScanError> {
        Ok(vec![ReservationEntry {
            name: "res-1".to_string(),
            display_name: Some("OpenAI PTU".to_string()),
            quantity: Some(self.0),
            sku_description: Some("Provisioned Throughput Unit".to_string()),
            ..Default::default()
        }])
    }
}

fn ptu_deployment() -> DeploymentEntry {
    DeploymentEntry {
        name: "gpt4-ptu".to_string(),
        model_name: Some("gpt-4".to_string()),
        sku_name: Some("ProvisionedManaged".to_string()),
        capacity: Some(100),
    }
}

fn server_with(
    deployments: Result<Vec<DeploymentEntry>, ScanError>,
    reserved: u64,
) -> (TestServer, Arc<BufferSink>) {
    let sink = Arc::new(BufferSink::new());
    let capabilities = Capabilities::new(
        Arc::new(FakeDeployments(deployments)),
        Arc::new(FakeReservations(reserved)),
    );
    let state =
        AppState::new_with_components(SentinelConfig::default(), capabilities, sink.clone());
    (TestServer::new(build_router(state)).unwrap(), sink)
}

fn deployment_event(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "eventType": "Microsoft.Resources.ResourceWriteSuccess",
        "subject": SUBJECT,
        "eventTime": "2026-10-19T08:00:00Z",
        "data": {
            "operationName": "Microsoft.CognitiveServices/accounts/deployments/write",
            "status": status,
            "subscriptionId": "sub-1"
        }
    })
}

#[tokio::test]
async fn test_validation_handshake_echoes_code() {
    let (server, sink) = server_with(Ok(vec![ptu_deployment()]), 200);

    let response = server
        .post("/api/events")
        .json(&json!([{
            "id": "v-1",
            "eventType": "Microsoft.EventGrid.SubscriptionValidationEvent",
            "subject": "",
            "data": {"validationCode": "512d38b6-c7b8-40c8-89fe-f46f9e9622b6"}
        }]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["validationResponse"], "512d38b6-c7b8-40c8-89fe-f46f9e9622b6");
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_validation_without_code_is_rejected() {
    let (server, _) = server_with(Ok(vec![]), 0);

    let response = server
        .post("/api/events")
        .json(&json!([{
            "id": "v-2",
            "eventType": "Microsoft.EventGrid.SubscriptionValidationEvent",
            "data": {}
        }]))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_batch_reports_and_skips_per_event() {
    let (server, sink) = server_with(Ok(vec![ptu_deployment()]), 200);

    let response = server
        .post("/api/events")
        .json(&json!([deployment_event("e-1", "Succeeded"), deployment_event("e-2", "Failed")]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0]["outcome"], "reported");
    assert_eq!(results[0]["event_id"], "e-1");
    assert_eq!(results[0]["status"]["status"], "under_utilized");
    assert_eq!(results[0]["deployed_units"], 100);
    assert_eq!(results[0]["reserved_units"], 200);
    assert_eq!(results[0]["partial"], false);

    assert_eq!(results[1]["outcome"], "skipped");
    assert_eq!(results[1]["event_id"], "e-2");

    assert!(sink.contains("PTU capacity vs reservations report"));
    assert!(sink.contains("aoai/gpt4-ptu: 100 units (gpt-4)"));
}

#[tokio::test]
async fn test_unreadable_account_fails_the_delivery() {
    let (server, sink) =
        server_with(Err(ScanError::AccessDenied { scope: "rg-ai/aoai".to_string() }), 200);

    let response = server
        .post("/api/events")
        .json(&json!([deployment_event("e-3", "Succeeded")]))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["results"][0]["outcome"], "failed");
    assert_eq!(body["results"][0]["kind"], "access_denied");
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let (server, _) = server_with(Ok(vec![]), 0);

    let response = server.post("/api/events").text("not json").await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_health() {
    let (server, _) = server_with(Ok(vec![]), 0);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}
