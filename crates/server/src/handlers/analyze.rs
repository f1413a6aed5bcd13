use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use pagelift_core::Report;
use tracing::debug;

use crate::state::AppState;
use crate::types::{AnalyzeRequest, ApiError};

/// Runs one analysis and answers with the finished report.
pub async fn analyze(
    State(state): State<AppState>, payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Report>, ApiError> {
    let Json(request) = payload?;
    let mode = request.mode()?;
    debug!(url = %request.url, %mode, "HTTP analyze request");

    let report = state.analyzer.analyze(&request.url, mode).await?;
    Ok(Json(report))
}
