//! HTTP API request and response types.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagelift_core::{CopyRow, ErrorKind, Mode, PageMeta, PageliftError, Report};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Body of every JSON error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

/// A failed request: status plus a human-readable message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Upstream | ErrorKind::Parsing => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PageliftError> for ApiError {
    fn from(err: PageliftError) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            warn!(error = %err, status = status.as_u16(), "request failed");
        }
        Self { status, message: err.to_string() }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

/// Analysis request, from a JSON body or a query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: String,
    /// `free` (default) or `full`; `paid` is accepted for `full`.
    #[serde(default)]
    pub mode: Option<String>,
}

impl AnalyzeRequest {
    pub fn mode(&self) -> Result<Mode, ApiError> {
        match self.mode.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(mode) => mode.parse().map_err(ApiError::bad_request),
            None => Ok(Mode::Free),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AugmentRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentResponse {
    pub ok: bool,
    pub rows: Vec<CopyRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub report: Report,
    /// When present the PDF is emailed instead of returned.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub ok: bool,
    pub emailed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreenshotQuery {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
    pub started_at: String,
}
