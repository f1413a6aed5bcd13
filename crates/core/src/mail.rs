//! Report delivery through a Resend-compatible email API.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use tracing::{info, warn};

use crate::{PageliftError, Result};

pub const DEFAULT_MAIL_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: Option<String>,
    pub from: String,
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: "Pagelift <reports@pagelift.dev>".to_string(),
            endpoint: DEFAULT_MAIL_ENDPOINT.to_string(),
            timeout: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct Attachment<'a> {
    filename: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct Outgoing<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    attachments: Vec<Attachment<'a>>,
}

/// Sends one email per call; holds no per-recipient state.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| PageliftError::ConfigError(format!("failed to build mail client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Sends `html` to `to` with `pdf` attached as `filename`.
    pub async fn send_report(&self, to: &str, subject: &str, html: &str, filename: &str, pdf: &[u8]) -> Result<()> {
        let key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PageliftError::Email("no mail API key configured".to_string()))?;

        let to = to.trim();
        if !looks_like_email(to) {
            return Err(PageliftError::InvalidEmail(to.to_string()));
        }

        let auth = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| PageliftError::Email(format!("invalid API key format: {e}")))?;

        let message = Outgoing {
            from: &self.config.from,
            to: [to],
            subject,
            html,
            attachments: vec![Attachment { filename, content: STANDARD.encode(pdf) }],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(AUTHORIZATION, auth)
            .json(&message)
            .send()
            .await
            .map_err(|e| PageliftError::Email(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "mail provider rejected message");
            return Err(PageliftError::Email(format!("provider answered HTTP {}: {}", status.as_u16(), body.trim())));
        }

        info!(bytes = pdf.len(), "report emailed");
        Ok(())
    }
}

fn looks_like_email(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !address.contains(char::is_whitespace),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        assert!(!HttpMailer::new(MailConfig::default()).unwrap().is_configured());
        let config = MailConfig { api_key: Some("  ".into()), ..Default::default() };
        assert!(!HttpMailer::new(config).unwrap().is_configured());
        let config = MailConfig { api_key: Some("re_123".into()), ..Default::default() };
        assert!(HttpMailer::new(config).unwrap().is_configured());
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("ana@example.com"));
        assert!(!looks_like_email("ana@localhost"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ana example@x.com"));
    }

    #[test]
    fn test_attachment_payload() {
        let message = Outgoing {
            from: "a@b.co",
            to: ["c@d.co"],
            subject: "s",
            html: "<p>h</p>",
            attachments: vec![Attachment { filename: "r.pdf", content: STANDARD.encode(b"%PDF-") }],
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["to"][0], "c@d.co");
        assert_eq!(value["attachments"][0]["content"], "JVBERi0=");
    }

    #[tokio::test]
    async fn test_send_without_key() {
        let mailer = HttpMailer::new(MailConfig::default()).unwrap();
        let err = mailer.send_report("a@b.co", "s", "h", "r.pdf", b"x").await.unwrap_err();
        assert!(matches!(err, PageliftError::Email(_)));
    }
}
