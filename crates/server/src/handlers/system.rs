use axum::Json;
use axum::extract::State;
use time::format_description::well_known::Rfc3339;

use crate::state::AppState;
use crate::types::HealthResponse;

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at.format(&Rfc3339).unwrap_or_default(),
    })
}
