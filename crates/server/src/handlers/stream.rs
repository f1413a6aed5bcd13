//! Streaming analysis over server-sent events.

use std::convert::Infallible;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderName;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::state::AppState;
use crate::types::{AnalyzeRequest, ApiError};

pub async fn analyze_stream_get(
    State(state): State<AppState>, query: Result<Query<AnalyzeRequest>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(request)) => stream_response(&state, request),
        Err(rejection) => ApiError::from(rejection).into_response(),
    }
}

pub async fn analyze_stream_post(
    State(state): State<AppState>, payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => stream_response(&state, request),
        Err(rejection) => ApiError::from(rejection).into_response(),
    }
}

/// Input problems inside the URL itself arrive as an `error` event, so the
/// client sees one failure path for everything the analysis rejects.
fn stream_response(state: &AppState, request: AnalyzeRequest) -> Response {
    let mode = match request.mode() {
        Ok(mode) => mode,
        Err(err) => return err.into_response(),
    };

    info!(url = %request.url, %mode, "SSE client connected");
    let rx = state.relay.spawn(request.url, mode);

    let stream = ReceiverStream::new(rx)
        .map(|event| Ok::<_, Infallible>(Event::default().event(event.name()).data(event.data_json())));

    (
        [(HeaderName::from_static("x-accel-buffering"), "no")],
        Sse::new(stream),
    )
        .into_response()
}
