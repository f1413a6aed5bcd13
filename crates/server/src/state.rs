//! Shared application state.

use std::sync::Arc;

use pagelift_core::{Analyzer, HttpMailer, HttpModelBackend, HttpPageSource, Relay, ScreenshotConfig};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::config::ServerArgs;

pub type LiveAnalyzer = Analyzer<HttpPageSource, HttpModelBackend>;
pub type LiveRelay = Relay<HttpPageSource, HttpModelBackend>;

/// Everything a handler needs. Cloning is cheap; nothing in here is mutable.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<LiveAnalyzer>,
    pub relay: LiveRelay,
    pub mailer: Arc<HttpMailer>,
    pub screenshots: Arc<ScreenshotConfig>,
    /// Client for screenshot downloads.
    pub http: reqwest::Client,
    pub started_at: OffsetDateTime,
}

impl AppState {
    pub fn from_args(args: &ServerArgs) -> pagelift_core::Result<Self> {
        let config = args.analyzer_config();

        let source = HttpPageSource::new(config.fetch.clone())?;
        let backend = HttpModelBackend::new(&config.model)?;
        if !backend.has_credential() {
            warn!("no model API key configured; analyses will fail until OPENAI_API_KEY is set");
        }

        let screenshots = Arc::new(config.screenshots.clone());
        let http = config.fetch.client()?;
        let analyzer = Arc::new(Analyzer::new(source, backend, config));
        let relay = Relay::new(Arc::clone(&analyzer), args.relay_config());

        let mailer = HttpMailer::new(args.mail_config())?;
        if !mailer.is_configured() {
            info!("email delivery disabled; export will only return PDFs");
        }

        Ok(Self { analyzer, relay, mailer: Arc::new(mailer), screenshots, http, started_at: OffsetDateTime::now_utc() })
    }
}
