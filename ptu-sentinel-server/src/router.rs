use axum::{
    extract::DefaultBodyLimit, http::StatusCode, response::IntoResponse, routing::get, Router,
};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

/// Event Grid caps a delivery batch at 1 MB.
const MAX_DELIVERY_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/api", api::router())
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_DELIVERY_BYTES))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(serde_json::json!({"status": "ok"})))
}
