//! Hosted-model client.
//!
//! The analyzer talks to a [`ModelBackend`], walks candidates with a
//! [`FallbackPolicy`], and pulls generated text out of whatever response shape
//! came back with [`output_text`].

pub mod adapter;
pub mod fallback;
pub mod http;
pub mod probe;

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

pub use adapter::output_text;
pub use fallback::{Attempted, FallbackPolicy};
pub use http::HttpModelBackend;
pub use probe::{ProbeAttempt, ProbeReport, probe_models};

/// Models tried, in order, after the preferred one.
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &["gpt-4.1-mini", "gpt-4o-mini", "gpt-4o"];

/// Environment variable named in missing-credential errors.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Errors from a single model call, before the fallback policy classifies them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// No API key configured; no request was sent.
    #[error("no API key configured")]
    MissingCredential,

    /// The provider answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered 2xx with a body that is not JSON.
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// A prompt plus the strict JSON schema the answer must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: String,
    pub user: String,
    /// Schema name reported to the provider.
    pub schema_name: String,
    /// JSON schema; `None` asks for free text.
    pub schema: Option<Value>,
    pub max_output_tokens: u32,
}

/// One call to a hosted model.
///
/// Implementations return the raw response body; shape handling lives in
/// [`output_text`] so provider drift never reaches the relay.
pub trait ModelBackend: Send + Sync {
    fn respond(&self, model: &str, request: &ModelRequest) -> impl Future<Output = Result<Value, ModelError>> + Send;
}

/// Provider connection settings.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without the trailing `/responses`.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Preferred model, tried first.
    pub preferred: Option<String>,
    /// Ordered fallbacks tried after `preferred`.
    pub fallbacks: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: 90,
            preferred: None,
            fallbacks: DEFAULT_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl ModelConfig {
    /// Preferred model first, then fallbacks, without duplicates or blanks.
    pub fn candidates(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for model in self.preferred.iter().chain(self.fallbacks.iter()) {
            let model = model.trim();
            if !model.is_empty() && !out.iter().any(|m| m == model) {
                out.push(model.to_string());
            }
        }
        out
    }

    pub fn policy(&self) -> FallbackPolicy {
        FallbackPolicy::new(self.candidates())
    }
}
