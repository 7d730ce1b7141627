//! API Routes
//!
//! Event Grid webhook endpoint.

use axum::{routing::post, Router};

use crate::state::AppState;

pub mod events;

pub fn router() -> Router<AppState> {
    Router::new().route("/events", post(events::handle_events))
}
