//! Route table and middleware stack.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;
use uuid::Uuid;

use crate::handlers;
use crate::state::AppState;

/// Builds the router.
///
/// Streams skip the timeout and compression layers: they are long-lived and
/// every event has to reach the client as soon as it is written.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let json_api: Router<AppState> = Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/augment-copy", post(handlers::augment_copy))
        .route("/export-pdf", post(handlers::export_pdf))
        .route("/screenshot", get(handlers::screenshot))
        .route("/models/probe", get(handlers::probe_models))
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CompressionLayer::new()),
        );

    let streaming: Router<AppState> = Router::new()
        .route("/analyze-stream", get(handlers::analyze_stream_get).post(handlers::analyze_stream_post));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        info_span!(
            "http",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %Uuid::new_v4(),
        )
    });

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", json_api.merge(streaming))
        .layer(ServiceBuilder::new().layer(trace).layer(cors))
        .with_state(state)
}
