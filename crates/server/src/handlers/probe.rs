use axum::Json;
use axum::extract::State;
use pagelift_core::ProbeReport;

use crate::state::AppState;

/// Reports which configured model currently answers.
pub async fn probe_models(State(state): State<AppState>) -> Json<ProbeReport> {
    Json(state.analyzer.probe().await)
}
