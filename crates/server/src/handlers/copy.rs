use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::debug;

use crate::state::AppState;
use crate::types::{ApiError, AugmentRequest, AugmentResponse};

/// Suggests rewrites for the page's headline copy.
pub async fn augment_copy(
    State(state): State<AppState>, payload: Result<Json<AugmentRequest>, JsonRejection>,
) -> Result<Json<AugmentResponse>, ApiError> {
    let Json(request) = payload?;
    debug!(url = %request.url, has_meta = request.meta.is_some(), "HTTP augment-copy request");

    let rows = state.analyzer.augment_copy(&request.url, request.meta).await?;
    Ok(Json(AugmentResponse { ok: true, rows }))
}
