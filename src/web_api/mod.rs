//! WebAPI - local status surface
//!
//! ## Responsibilities
//!
//! - Read-only views of status, inventory and detections
//! - Latest frame preview
//! - Manual inventory reset

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (backend_ok, tracker_ok) =
        tokio::join!(state.api_client.health_check(), state.tracker.health_check());

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        machine_id: state.settings.machine_id.clone(),
        backend_connected: backend_ok,
        tracker_connected: tracker_ok,
    };

    Json(response)
}
