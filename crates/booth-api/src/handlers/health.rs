//! Health check handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint: process liveness plus a store round-trip.
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let response = |status: &str| HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };

    // A cheap count proves the database is reachable
    match state.store.report(1, 1).await {
        Ok(_) => Ok(Json(response("healthy"))),
        Err(_) => Err((StatusCode::SERVICE_UNAVAILABLE, Json(response("degraded")))),
    }
}
