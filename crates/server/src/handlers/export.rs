use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use pagelift_core::{PdfLayout, email_html, email_subject, export_filename, render_pdf};
use tracing::info;

use crate::state::AppState;
use crate::types::{ApiError, ExportRequest, ExportResponse};

/// Renders a report to PDF and either emails it or returns it as a download.
///
/// Without mail credentials an `email` is ignored and the PDF is downloaded.
pub async fn export_pdf(
    State(state): State<AppState>, payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let report = request.report;

    let pdf = render_pdf(&report, &PdfLayout::default())?;
    let filename = export_filename(&report.url);

    let email = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    if let Some(email) = email.filter(|_| state.mailer.is_configured()) {
        state.mailer.send_report(email, &email_subject(&report), &email_html(&report), &filename, &pdf).await?;
        info!(%filename, "report exported by email");
        return Ok(Json(ExportResponse { ok: true, emailed: true }).into_response());
    }

    info!(%filename, bytes = pdf.len(), "report exported as download");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        pdf,
    )
        .into_response())
}
