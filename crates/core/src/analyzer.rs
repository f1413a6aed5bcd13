//! The fetch → extract → model → parse pipeline.
//!
//! [`Analyzer`] owns everything an analysis needs and shares nothing mutable
//! between requests, so one instance can sit behind an `Arc` in the server.
//! [`Analyzer::analyze_tracked`] publishes each state transition on a
//! `watch` channel for the streaming relay.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagelift_core::{Analyzer, AnalyzerConfig, HttpModelBackend, HttpPageSource, Mode, ModelConfig};
//!
//! # async fn run() -> pagelift_core::Result<()> {
//! let model = ModelConfig { api_key: std::env::var("OPENAI_API_KEY").ok(), ..Default::default() };
//! let config = AnalyzerConfig::builder().model(model.clone()).max_chars(16_000).build();
//! let analyzer = Analyzer::new(
//!     HttpPageSource::new(config.fetch.clone())?,
//!     HttpModelBackend::new(&model)?,
//!     config,
//! );
//! let report = analyzer.analyze("example.com", Mode::Free).await?;
//! println!("{} scored {}", report.url, report.score);
//! # Ok(())
//! # }
//! ```

use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span};
use url::Url;
use uuid::Uuid;

use crate::copy::{CopyRow, parse_copy_rows};
use crate::extract::{ExtractConfig, extract_text};
use crate::fetch::{FetchConfig, PageSource};
use crate::meta::PageMeta;
use crate::model::{FallbackPolicy, ModelBackend, ModelConfig, ProbeReport, output_text, probe_models};
use crate::normalize::{normalize_url, report_url};
use crate::prompt::{copy_request, report_request};
use crate::relay::RelayState;
use crate::report::{Mode, RawReport, Report, ReportContext};
use crate::screenshot::ScreenshotConfig;
use crate::sections::detect_sections;
use crate::{PageliftError, Result};

/// Everything an [`Analyzer`] is configured with.
///
/// Passed in explicitly; nothing is read from the environment here.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub model: ModelConfig,
    pub screenshots: ScreenshotConfig,
    /// Output token budget for free reports.
    pub free_output_tokens: u32,
    /// Output token budget for full reports.
    pub full_output_tokens: u32,
    /// Output token budget for copy suggestions.
    pub copy_output_tokens: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            extract: ExtractConfig::default(),
            model: ModelConfig::default(),
            screenshots: ScreenshotConfig::default(),
            free_output_tokens: 1_200,
            full_output_tokens: 4_000,
            copy_output_tokens: 1_000,
        }
    }
}

impl AnalyzerConfig {
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::new()
    }

    fn output_tokens(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Free => self.free_output_tokens,
            Mode::Full => self.full_output_tokens,
        }
    }
}

/// Fluent builder for [`AnalyzerConfig`].
///
/// ```rust
/// use pagelift_core::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .timeout(10)
///     .max_chars(16_000)
///     .preferred_model("gpt-4o")
///     .build();
/// assert_eq!(config.model.candidates()[0], "gpt-4o");
/// ```
#[derive(Debug, Default)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page fetch timeout in seconds.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.config.fetch.timeout = secs;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.fetch.user_agent = user_agent.into();
        self
    }

    /// Character budget for extracted page text.
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.config.extract.max_chars = max_chars;
        self
    }

    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    pub fn preferred_model(mut self, model: impl Into<String>) -> Self {
        self.config.model.preferred = Some(model.into());
        self
    }

    pub fn fallback_models(mut self, models: Vec<String>) -> Self {
        self.config.model.fallbacks = models;
        self
    }

    pub fn screenshots(mut self, screenshots: ScreenshotConfig) -> Self {
        self.config.screenshots = screenshots;
        self
    }

    pub fn build(self) -> AnalyzerConfig {
        self.config
    }
}

/// Runs analyses against a page source and a model backend.
#[derive(Debug)]
pub struct Analyzer<S, B> {
    source: S,
    backend: B,
    policy: FallbackPolicy,
    config: AnalyzerConfig,
}

impl<S: PageSource, B: ModelBackend> Analyzer<S, B> {
    pub fn new(source: S, backend: B, config: AnalyzerConfig) -> Self {
        let policy = config.model.policy();
        Self { source, backend, policy, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs one analysis without progress reporting.
    pub async fn analyze(&self, input: &str, mode: Mode) -> Result<Report> {
        let (state, _rx) = watch::channel(RelayState::Idle);
        self.analyze_tracked(input, mode, &state).await
    }

    /// Runs one analysis, publishing every state transition on `state`.
    ///
    /// `state` ends at [`RelayState::Done`] on success. On failure it is left
    /// at the state that failed; the caller owns the transition to `Failed`.
    pub async fn analyze_tracked(&self, input: &str, mode: Mode, state: &watch::Sender<RelayState>) -> Result<Report> {
        let request_id = Uuid::new_v4();
        let span = info_span!("analysis", %request_id, %mode);

        async move {
            let url = normalize_url(input)?;
            let display_url = report_url(input)?;
            info!(%url, "analysis started");

            advance(state, RelayState::Fetching);
            let html = self.source.fetch(&url).await?;

            advance(state, RelayState::Extracting);
            let meta = PageMeta::from_html(&html);
            let text = extract_text(&html, &self.config.extract);
            if text.is_empty() {
                return Err(PageliftError::NoContent);
            }
            let sections = detect_sections(&text.text);
            debug!(chars = text.text.len(), truncated = text.truncated, "page text extracted");

            advance(state, RelayState::ModelCalling);
            let request = report_request(&url, &meta, &sections, &text, mode, self.config.output_tokens(mode));
            let attempted = self
                .policy
                .run(|model| {
                    let request = &request;
                    async move { self.backend.respond(&model, request).await }
                })
                .await?;

            advance(state, RelayState::Parsing);
            let generated = output_text(&attempted.value)
                .ok_or_else(|| PageliftError::InvalidModelOutput("response contained no text".to_string()))?;
            let raw = RawReport::parse(&generated)?;

            let screenshots = self.config.screenshots.resolve(&url);
            let report = Report::assemble(
                raw,
                ReportContext {
                    url: display_url,
                    meta,
                    sections,
                    screenshots,
                    mode,
                    model: Some(attempted.model.clone()),
                },
            );

            advance(state, RelayState::Done);
            info!(model = %attempted.model, tried = attempted.tried.len(), score = report.score, "analysis finished");
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Suggests rewrites for the page's title, description, H1 and CTAs.
    ///
    /// When `meta` is `None` the page is fetched and its metadata extracted.
    pub async fn augment_copy(&self, input: &str, meta: Option<PageMeta>) -> Result<Vec<CopyRow>> {
        let url = normalize_url(input)?;
        let meta = match meta {
            Some(meta) if !meta.is_empty() => meta,
            _ => PageMeta::from_html(&self.source.fetch(&url).await?),
        };

        let request = copy_request(&url, &meta, self.config.copy_output_tokens);
        let attempted = self
            .policy
            .run(|model| {
                let request = &request;
                async move { self.backend.respond(&model, request).await }
            })
            .await?;

        let generated = output_text(&attempted.value)
            .ok_or_else(|| PageliftError::InvalidModelOutput("response contained no text".to_string()))?;
        parse_copy_rows(&generated)
    }

    /// Checks which candidate model currently answers.
    pub async fn probe(&self) -> ProbeReport {
        probe_models(&self.backend, &self.policy).await
    }

    /// Resolves screenshot URLs for `url` without running an analysis.
    pub fn screenshot_urls(&self, url: &Url) -> crate::screenshot::Screenshots {
        self.config.screenshots.resolve(url)
    }
}

fn advance(state: &watch::Sender<RelayState>, next: RelayState) {
    state.send_if_modified(|current| {
        if current.can_advance_to(next) {
            *current = next;
            true
        } else {
            false
        }
    });
}
