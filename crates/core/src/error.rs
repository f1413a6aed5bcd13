//! Error types for pagelift operations.
//!
//! This module defines [`PageliftError`], the single error type returned by
//! URL normalization, page fetching, model calls, report parsing and export.
//! Every failure is scoped to one request: the server turns it into an HTTP
//! status or a terminal `error` stream event, never a process exit.
//!
//! # Example
//!
//! ```rust
//! use pagelift_core::{PageliftError, Result, normalize_url};
//!
//! fn host_of(input: &str) -> Result<String> {
//!     let url = normalize_url(input)?;
//!     url.host_str()
//!         .map(str::to_string)
//!         .ok_or_else(|| PageliftError::InvalidUrl(input.to_string()))
//! }
//! # assert_eq!(host_of("example.com").unwrap(), "example.com");
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ModelError;

/// Main error type for analysis, relay and export operations.
///
/// # Example
///
/// ```rust
/// use pagelift_core::{ErrorKind, PageliftError};
///
/// let err = PageliftError::HttpStatus { status: 404, url: "https://example.com/".into() };
/// assert_eq!(err.kind(), ErrorKind::Upstream);
/// assert!(err.to_string().contains("404"));
/// ```
#[derive(Error, Debug)]
pub enum PageliftError {
    /// HTTP transport errors from reqwest.
    ///
    /// DNS failures, refused connections, TLS problems and body decoding errors.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The target page answered with a non-2xx status.
    #[error("Fetching {url} failed with HTTP {status}")]
    HttpStatus { status: u16, url: String },

    /// Missing, empty or malformed URL input.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A recipient address that cannot be an email address.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// The fetched page contained no extractable text.
    #[error("No readable text could be extracted from the page")]
    NoContent,

    /// No API credential is configured for the model provider.
    #[error("Missing API credential: set {0}")]
    MissingCredential(String),

    /// Every candidate model failed with a model-related error.
    #[error("All models failed (tried {}): {last}", .tried.join(", "))]
    ModelsExhausted { tried: Vec<String>, last: String },

    /// A model call failed with an error the fallback policy treats as terminal.
    #[error("Model request failed: {0}")]
    Model(ModelError),

    /// The model answered, but its output is not JSON or does not fit the schema.
    #[error("Model returned invalid output: {0}")]
    InvalidModelOutput(String),

    /// PDF rendering errors.
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    /// Email delivery errors.
    #[error("Email delivery failed: {0}")]
    Email(String),

    /// Screenshot provider errors.
    #[error("Screenshot capture failed: {0}")]
    Screenshot(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("I/O error: {0}")]
    WriteError(#[from] std::io::Error),

    /// Invalid configuration values.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Coarse classification used to pick an HTTP status for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input; never retried.
    Validation,
    /// The target site, the model provider or another collaborator failed.
    Upstream,
    /// The model answered with unusable output.
    Parsing,
    /// Local failures: configuration, I/O, rendering.
    Internal,
}

impl PageliftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PageliftError::InvalidUrl(_) | PageliftError::InvalidEmail(_) | PageliftError::FileNotFound(_) => {
                ErrorKind::Validation
            },
            PageliftError::HttpError(_)
            | PageliftError::Timeout { .. }
            | PageliftError::HttpStatus { .. }
            | PageliftError::NoContent
            | PageliftError::ModelsExhausted { .. }
            | PageliftError::Model(_)
            | PageliftError::Email(_)
            | PageliftError::Screenshot(_) => ErrorKind::Upstream,
            PageliftError::InvalidModelOutput(_) => ErrorKind::Parsing,
            PageliftError::MissingCredential(_)
            | PageliftError::Pdf(_)
            | PageliftError::WriteError(_)
            | PageliftError::ConfigError(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for PageliftError {
    fn from(err: serde_json::Error) -> Self {
        PageliftError::InvalidModelOutput(err.to_string())
    }
}

#[cfg(feature = "pdf")]
impl From<lopdf::Error> for PageliftError {
    fn from(err: lopdf::Error) -> Self {
        PageliftError::Pdf(err.to_string())
    }
}

/// Result type alias for PageliftError.
pub type Result<T> = std::result::Result<T, PageliftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PageliftError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_http_status_mentions_code() {
        let err = PageliftError::HttpStatus { status: 404, url: "https://example.com/missing".to_string() };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("https://example.com/missing"));
    }

    #[test]
    fn test_models_exhausted_lists_candidates() {
        let err = PageliftError::ModelsExhausted {
            tried: vec!["a".to_string(), "b".to_string()],
            last: "model not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a, b"));
        assert!(msg.contains("model not found"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(PageliftError::InvalidUrl(String::new()).kind(), ErrorKind::Validation);
        assert_eq!(PageliftError::Timeout { timeout: 30 }.kind(), ErrorKind::Upstream);
        assert_eq!(PageliftError::InvalidModelOutput("x".into()).kind(), ErrorKind::Parsing);
        assert_eq!(PageliftError::MissingCredential("OPENAI_API_KEY".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_timeout_error() {
        let err = PageliftError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
