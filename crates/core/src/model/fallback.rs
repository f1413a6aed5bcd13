//! Ordered model fallback.
//!
//! Candidates are tried one after another, never concurrently. Only errors
//! that look model-specific move on to the next candidate; anything else is
//! terminal for the whole request.

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{API_KEY_ENV, ModelError};
use crate::{PageliftError, Result};

static MODEL_RELATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\bmodel\b|model_not_found|does not exist|not supported|unsupported|unknown model|no access to)")
        .unwrap()
});

/// A successful call plus which candidate produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub model: String,
    /// Every candidate called, in order, including the successful one.
    pub tried: Vec<String>,
}

/// Candidate list plus the rule deciding "try next" versus "abort".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    candidates: Vec<String>,
}

impl FallbackPolicy {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Whether `err` should move on to the next candidate.
    ///
    /// 404 and 400 always do; other statuses only when the message names a
    /// model problem. Missing credentials, transport failures and malformed
    /// bodies abort.
    pub fn should_try_next(err: &ModelError) -> bool {
        match err {
            ModelError::Status { status: 404 | 400, .. } => true,
            ModelError::Status { message, .. } => MODEL_RELATED.is_match(message),
            ModelError::MissingCredential | ModelError::Transport(_) | ModelError::MalformedBody(_) => false,
        }
    }

    /// Runs `attempt` against each candidate until one succeeds or the policy aborts.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<Attempted<T>>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = std::result::Result<T, ModelError>>,
    {
        if self.candidates.is_empty() {
            return Err(PageliftError::ConfigError("no candidate models configured".to_string()));
        }

        let mut tried = Vec::with_capacity(self.candidates.len());
        let mut last_error = None;

        for model in &self.candidates {
            tried.push(model.clone());
            debug!(%model, attempt = tried.len(), "calling model");

            match attempt(model.clone()).await {
                Ok(value) => return Ok(Attempted { value, model: model.clone(), tried }),
                Err(ModelError::MissingCredential) => {
                    return Err(PageliftError::MissingCredential(API_KEY_ENV.to_string()));
                }
                Err(err) if Self::should_try_next(&err) => {
                    warn!(%model, error = %err, "model unavailable, trying next candidate");
                    last_error = Some(err);
                }
                Err(err) => {
                    warn!(%model, error = %err, "model call failed, not retrying");
                    return Err(PageliftError::Model(err));
                }
            }
        }

        Err(PageliftError::ModelsExhausted {
            tried,
            last: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
