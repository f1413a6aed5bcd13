use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use pagelift_core::require_http_url;
use tracing::warn;

use crate::state::AppState;
use crate::types::ScreenshotQuery;

/// Returns a PNG of the page. Errors are plain text, not JSON.
pub async fn screenshot(State(state): State<AppState>, Query(query): Query<ScreenshotQuery>) -> Response {
    let target = match require_http_url(&query.url) {
        Ok(target) => target,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    match state.screenshots.capture_png(&state.http, &target).await {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png"), (header::CACHE_CONTROL, "public, max-age=300")], png)
            .into_response(),
        Err(err) => {
            warn!(%target, error = %err, "screenshot failed");
            (StatusCode::BAD_GATEWAY, err.to_string()).into_response()
        }
    }
}
