//! Server configuration from flags and environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use pagelift_core::{AnalyzerConfig, MailConfig, ModelConfig, RelayConfig, ScreenshotConfig};

pub const DEFAULT_LOG_FILTER: &str = "pagelift_server=info,pagelift_core=info,tower_http=info";

/// Every option can also be set through the environment variable shown in `--help`.
#[derive(Parser, Debug, Clone)]
#[command(name = "pagelift-server", version, about = "Landing-page conversion audits over HTTP")]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "PAGELIFT_LISTEN", default_value = "127.0.0.1:8787")]
    pub listen: SocketAddr,

    /// API key for the model provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub base_url: String,

    /// Preferred model, tried before the fallbacks
    #[arg(long, env = "PAGELIFT_MODEL")]
    pub model: Option<String>,

    /// Comma-separated fallback models, tried in order
    #[arg(long, env = "PAGELIFT_FALLBACK_MODELS", value_delimiter = ',')]
    pub fallback_models: Vec<String>,

    /// Page fetch timeout in seconds
    #[arg(long, env = "PAGELIFT_FETCH_TIMEOUT", default_value_t = 20)]
    pub fetch_timeout: u64,

    /// Character budget for extracted page text
    #[arg(long, env = "PAGELIFT_MAX_CHARS", default_value_t = pagelift_core::DEFAULT_MAX_CHARS)]
    pub max_chars: usize,

    /// Hero screenshot URL template; `{url}` is replaced with the encoded page URL
    #[arg(long, env = "PAGELIFT_SCREENSHOT_TEMPLATE")]
    pub screenshot_template: Option<String>,

    /// Full-page screenshot URL template
    #[arg(long, env = "PAGELIFT_SCREENSHOT_FULL_TEMPLATE")]
    pub screenshot_full_template: Option<String>,

    /// Remote headless-browser screenshot endpoint
    #[arg(long, env = "PAGELIFT_BROWSER_ENDPOINT")]
    pub browser_endpoint: Option<String>,

    /// Token for the remote browser
    #[arg(long, env = "PAGELIFT_BROWSER_TOKEN", hide_env_values = true)]
    pub browser_token: Option<String>,

    /// API key for the email provider
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub mail_api_key: Option<String>,

    /// Sender address for report emails
    #[arg(long, env = "PAGELIFT_MAIL_FROM")]
    pub mail_from: Option<String>,

    /// Email API endpoint
    #[arg(long, env = "PAGELIFT_MAIL_ENDPOINT", default_value = pagelift_core::mail::DEFAULT_MAIL_ENDPOINT)]
    pub mail_endpoint: String,

    /// Timeout for non-streaming requests, in seconds
    #[arg(long, env = "PAGELIFT_REQUEST_TIMEOUT", default_value_t = 120)]
    pub request_timeout: u64,

    /// Heartbeat interval for streams, in seconds
    #[arg(long, env = "PAGELIFT_HEARTBEAT", default_value_t = 15)]
    pub heartbeat: u64,
}

impl ServerArgs {
    pub fn model_config(&self) -> ModelConfig {
        let mut config = ModelConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            preferred: self.model.clone(),
            ..Default::default()
        };
        let fallbacks: Vec<String> =
            self.fallback_models.iter().map(|m| m.trim().to_string()).filter(|m| !m.is_empty()).collect();
        if !fallbacks.is_empty() {
            config.fallbacks = fallbacks;
        }
        config
    }

    pub fn screenshot_config(&self) -> ScreenshotConfig {
        let mut config = ScreenshotConfig {
            full_page_template: self.screenshot_full_template.clone(),
            browser_endpoint: self.browser_endpoint.clone(),
            browser_token: self.browser_token.clone(),
            ..Default::default()
        };
        if let Some(template) = &self.screenshot_template {
            config.hero_template = template.clone();
        }
        config
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::builder()
            .timeout(self.fetch_timeout)
            .max_chars(self.max_chars)
            .model(self.model_config())
            .screenshots(self.screenshot_config())
            .build()
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig { heartbeat_interval: Duration::from_secs(self.heartbeat.max(1)), ..Default::default() }
    }

    pub fn mail_config(&self) -> MailConfig {
        let mut config =
            MailConfig { api_key: self.mail_api_key.clone(), endpoint: self.mail_endpoint.clone(), ..Default::default() };
        if let Some(from) = &self.mail_from {
            config.from = from.clone();
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }
}
