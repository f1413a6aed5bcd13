//! Page fetching from URLs, files, and stdin.
//!
//! The analyzer only ever sees a [`PageSource`]; [`HttpPageSource`] is the
//! reqwest-backed implementation used in production. Files and stdin are kept
//! for offline extraction from the CLI.

use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::{PageliftError, Result};

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 20,
            user_agent: "Mozilla/5.0 (compatible; PageliftBot/0.4; +https://github.com/stormlightlabs/pagelift)"
                .to_string(),
            max_redirects: 10,
        }
    }
}

impl FetchConfig {
    /// Builds a reqwest client honoring this configuration.
    pub fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .redirect(Policy::limited(self.max_redirects))
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(PageliftError::HttpError)
    }
}

/// Anything that can turn a URL into page HTML.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

/// Fetches pages over HTTP with a shared, pooled client.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    config: FetchConfig,
}

impl HttpPageSource {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = config.client()?;
        Ok(Self { client, config })
    }
}

impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &Url) -> Result<String> {
        fetch_with_client(&self.client, url, self.config.timeout).await
    }
}

/// Fetches HTML content from a URL.
///
/// This function performs an HTTP GET request and returns the response body as text.
/// It follows redirects, respects the configured timeout, and surfaces any
/// non-2xx status as [`PageliftError::HttpStatus`].
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| PageliftError::InvalidUrl(e.to_string()))?;
    let client = config.client()?;
    fetch_with_client(&client, &parsed_url, config.timeout).await
}

async fn fetch_with_client(client: &Client, url: &Url, timeout: u64) -> Result<String> {
    debug!(%url, "fetching page");

    let response = client
        .get(url.clone())
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                PageliftError::Timeout { timeout }
            } else {
                PageliftError::HttpError(e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageliftError::HttpStatus { status: status.as_u16(), url: url.to_string() });
    }

    let content = response.text().await?;
    debug!(%url, bytes = content.len(), "page fetched");

    Ok(content)
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(PageliftError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(PageliftError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(PageliftError::from)?;

    Ok(buffer)
}
