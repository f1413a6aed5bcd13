//! Which configured model answers right now?

use serde::Serialize;
use tracing::info;

use super::{FallbackPolicy, ModelBackend, ModelError, ModelRequest, output_text};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeAttempt {
    pub model: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub ok: bool,
    pub chosen_model: Option<String>,
    pub tried: Vec<ProbeAttempt>,
    /// First characters of the chosen model's reply.
    pub sample: Option<String>,
}

fn probe_request() -> ModelRequest {
    ModelRequest {
        system: "You are a health check. Reply with the single word OK.".to_string(),
        user: "ping".to_string(),
        schema_name: "probe".to_string(),
        schema: None,
        max_output_tokens: 16,
    }
}

/// Calls each candidate in order until one answers.
///
/// Unlike an analysis, every failure is recorded and probing continues, so
/// the report shows why earlier candidates were skipped. A missing credential
/// stops probing immediately since no candidate can succeed.
pub async fn probe_models<B: ModelBackend>(backend: &B, policy: &FallbackPolicy) -> ProbeReport {
    let request = probe_request();
    let mut tried = Vec::new();

    for model in policy.candidates() {
        match backend.respond(model, &request).await {
            Ok(body) => {
                let sample = output_text(&body).map(|t| t.chars().take(80).collect::<String>());
                tried.push(ProbeAttempt { model: model.clone(), ok: true, status: Some(200), error: None });
                info!(%model, "model probe succeeded");
                return ProbeReport { ok: true, chosen_model: Some(model.clone()), tried, sample };
            }
            Err(err) => {
                let status = match &err {
                    ModelError::Status { status, .. } => Some(*status),
                    _ => None,
                };
                let stop = err == ModelError::MissingCredential;
                tried.push(ProbeAttempt { model: model.clone(), ok: false, status, error: Some(err.to_string()) });
                if stop {
                    break;
                }
            }
        }
    }

    ProbeReport { ok: false, chosen_model: None, tried, sample: None }
}
