//! API Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(super::health_check))
        .route("/status", get(get_status))
        // Inventory
        .route("/inventory", get(get_inventory))
        .route("/inventory/reset", post(reset_inventory))
        // Live view
        .route("/detections", get(get_detections))
        .route("/preview/snapshot", get(get_snapshot))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.status.status().await)
}

async fn get_inventory(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.inventory.current_inventory().await)
}

async fn reset_inventory(State(state): State<AppState>) -> impl IntoResponse {
    state.inventory.reset().await;
    tracing::info!(machine_id = %state.settings.machine_id, "Inventory reset via API");
    Json(json!({"ok": true}))
}

async fn get_detections(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.status.latest_detections().await)
}

async fn get_snapshot(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let frame = state
        .status
        .latest_frame()
        .await
        .ok_or_else(|| Error::NotFound("No frame captured yet".to_string()))?;

    Ok((
        StatusCode::OK,
        [
            ("content-type", frame.content_type),
            (
                "cache-control",
                "no-cache, no-store, must-revalidate".to_string(),
            ),
        ],
        frame.data,
    ))
}
