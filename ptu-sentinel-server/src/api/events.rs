//! Event Grid delivery handler.
//!
//! A delivery is either the subscription-validation handshake or a batch of
//! resource events. Each resource event is validated and, when accepted, runs
//! one reconciliation pass. Any failed pass turns the response into a 500 so
//! Event Grid redelivers the batch; passes keep no state, so a redelivery
//! only repeats the report.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use ptu_sentinel_core::modules::intake::{parse_events, validate_event, EventGridEvent};
use ptu_sentinel_core::reconcile;
use ptu_sentinel_types::CoverageStatus;

use crate::state::AppState;

/// Result of one event in a delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Event did not pass intake; no report was produced
    Skipped { event_id: String, reason: String },
    Reported {
        event_id: String,
        status: CoverageStatus,
        deployed_units: u64,
        reserved_units: u64,
        partial: bool,
    },
    Failed { event_id: String, kind: String, error: String },
}

impl EventOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub results: Vec<EventOutcome>,
}

pub async fn handle_events(State(state): State<AppState>, body: String) -> Response {
    let events = match parse_events(&body) {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!("Rejected Event Grid delivery: {}", e);
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": e.to_string()})))
                .into_response();
        },
    };

    if let Some(validation) = events.iter().find(|e| e.is_subscription_validation()) {
        return match validation.validation_code() {
            Some(code) => {
                tracing::info!(event_id = %validation.id, "Answered Event Grid subscription validation");
                Json(serde_json::json!({"validationResponse": code})).into_response()
            },
            None => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "validation event without validationCode"})),
            )
                .into_response(),
        };
    }

    let results = process_events(&state, &events).await;
    let status = if results.iter().any(EventOutcome::is_failed) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(DeliveryResponse { results })).into_response()
}

/// Run every event of a delivery through intake and the engine, in order.
pub async fn process_events(state: &AppState, events: &[EventGridEvent]) -> Vec<EventOutcome> {
    let mut results = Vec::with_capacity(events.len());

    for event in events {
        let outcome = match validate_event(event) {
            Err(e) => {
                tracing::info!(event_id = %event.id, kind = e.kind(), "Skipping event: {}", e);
                EventOutcome::Skipped { event_id: event.id.clone(), reason: e.to_string() }
            },
            Ok(deployment_event) => {
                let inner = &state.inner;
                match reconcile(
                    &deployment_event,
                    &inner.capabilities,
                    &inner.config,
                    inner.sink.as_ref(),
                )
                .await
                {
                    Ok(report) => EventOutcome::Reported {
                        event_id: event.id.clone(),
                        partial: report.is_partial(),
                        status: report.status,
                        deployed_units: report.deployed_units,
                        reserved_units: report.reserved_units,
                    },
                    Err(e) => {
                        tracing::error!(event_id = %event.id, kind = e.kind(), "Reconciliation failed: {}", e);
                        EventOutcome::Failed {
                            event_id: event.id.clone(),
                            kind: e.kind().to_string(),
                            error: e.to_string(),
                        }
                    },
                }
            },
        };
        results.push(outcome);
    }

    results
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
