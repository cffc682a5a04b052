//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::{app::AppState, error::AppError};

/// Health check response.
///
/// Deliberately a single field so load balancers can match it exactly.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check handler.
///
/// # Checks
///
/// - Storage connectivity (simple round trip)
///
/// # Response (200 OK)
///
/// ```json
/// { "status": "ok" }
/// ```
///
/// # Response (500 Internal Server Error)
///
/// If the database is unreachable, returns the standard error response.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.store.ping().await?;

    Ok(Json(HealthResponse { status: "ok" }))
}
