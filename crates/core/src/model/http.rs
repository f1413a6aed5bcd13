//! HTTP backend for OpenAI-compatible Responses APIs.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{ModelBackend, ModelConfig, ModelError, ModelRequest};
use crate::{PageliftError, Result};

/// Posts [`ModelRequest`]s to `{base_url}/responses`.
#[derive(Debug, Clone)]
pub struct HttpModelBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

/// OpenAI error body: `{"error": {"message": ..., "code": ...}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl HttpModelBackend {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let endpoint = format!("{}/responses", config.base_url.trim_end_matches('/'));
        info!(%endpoint, candidates = config.candidates().len(), "initializing model backend");

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .default_headers(headers)
            .build()
            .map_err(|e| PageliftError::ConfigError(format!("failed to build model HTTP client: {e}")))?;

        let api_key = config.api_key.as_ref().map(|k| k.trim().to_string()).filter(|k| !k.is_empty());

        Ok(Self { client, endpoint, api_key })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn body(model: &str, request: &ModelRequest) -> Value {
        let mut body = json!({
            "model": model,
            "input": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_output_tokens": request.max_output_tokens,
        });

        if let Some(schema) = &request.schema {
            body["text"] = json!({
                "format": {
                    "type": "json_schema",
                    "name": request.schema_name,
                    "schema": schema,
                    "strict": true,
                }
            });
        }
        body
    }
}

impl ModelBackend for HttpModelBackend {
    async fn respond(&self, model: &str, request: &ModelRequest) -> std::result::Result<Value, ModelError> {
        let key = self.api_key.as_deref().ok_or(ModelError::MissingCredential)?;
        let auth = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| ModelError::Transport(format!("invalid API key format: {e}")))?;

        debug!(%model, endpoint = %self.endpoint, "sending model request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, auth)
            .json(&Self::body(model, request))
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ModelError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(env) => match env.error.code {
                    Some(code) => format!("{} ({code})", env.error.message),
                    None => env.error.message,
                },
                Err(_) => text.chars().take(300).collect(),
            };
            return Err(ModelError::Status { status: status.as_u16(), message });
        }

        serde_json::from_str(&text).map_err(|e| ModelError::MalformedBody(e.to_string()))
    }
}
