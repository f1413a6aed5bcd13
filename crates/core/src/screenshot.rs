//! Hero screenshots via a template URL or a remote headless browser.
//!
//! Reports only carry screenshot URLs built from templates; bytes are fetched
//! on demand by [`ScreenshotConfig::capture_png`] for the screenshot endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::{PageliftError, Result};

const URL_PLACEHOLDER: &str = "{url}";

/// Default hero template: WordPress mShots, which renders on first request.
pub const DEFAULT_HERO_TEMPLATE: &str = "https://s.wordpress.com/mshots/v1/{url}?w=1280&h=800";

/// Screenshot URLs attached to a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshots {
    #[serde(default)]
    pub hero: Option<String>,
    #[serde(default)]
    pub full_page: Option<String>,
}

/// Where screenshots come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotConfig {
    /// Template with a `{url}` placeholder for the above-the-fold image.
    pub hero_template: String,
    /// Optional template for a full-page capture.
    pub full_page_template: Option<String>,
    /// Remote headless browser `/screenshot` endpoint (browserless-compatible).
    pub browser_endpoint: Option<String>,
    /// Token appended as `?token=` to the browser endpoint.
    pub browser_token: Option<String>,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            hero_template: DEFAULT_HERO_TEMPLATE.to_string(),
            full_page_template: None,
            browser_endpoint: None,
            browser_token: None,
        }
    }
}

impl ScreenshotConfig {
    /// Builds report screenshot URLs for `target`.
    pub fn resolve(&self, target: &Url) -> Screenshots {
        Screenshots {
            hero: render_template(&self.hero_template, target),
            full_page: self.full_page_template.as_deref().and_then(|t| render_template(t, target)),
        }
    }

    /// Captures a PNG of `target`.
    ///
    /// Uses the remote browser when configured, otherwise downloads the hero
    /// template image.
    pub async fn capture_png(&self, client: &Client, target: &Url) -> Result<Vec<u8>> {
        let response = match &self.browser_endpoint {
            Some(endpoint) => {
                let mut endpoint = Url::parse(endpoint)
                    .map_err(|e| PageliftError::ConfigError(format!("invalid browser endpoint: {e}")))?;
                if let Some(token) = &self.browser_token {
                    endpoint.query_pairs_mut().append_pair("token", token);
                }
                debug!(%target, "capturing screenshot via remote browser");
                client
                    .post(endpoint)
                    .json(&json!({
                        "url": target.as_str(),
                        "options": { "type": "png", "fullPage": false },
                        "viewport": { "width": 1280, "height": 800 },
                    }))
                    .send()
                    .await?
            }
            None => {
                let source = render_template(&self.hero_template, target)
                    .ok_or_else(|| PageliftError::ConfigError("screenshot template produced no URL".to_string()))?;
                debug!(%target, %source, "capturing screenshot via template");
                client.get(source).send().await?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(PageliftError::Screenshot(format!("provider answered HTTP {}", status.as_u16())));
        }

        let bytes = response.bytes().await?;
        if !is_png(&bytes) {
            return Err(PageliftError::Screenshot("provider did not return a PNG image".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

/// Substitutes the percent-encoded target into `template`.
///
/// Returns `None` for blank templates; templates without `{url}` are used verbatim.
pub fn render_template(template: &str, target: &Url) -> Option<String> {
    let template = template.trim();
    if template.is_empty() {
        return None;
    }
    let encoded: String = byte_serialize(target.as_str().as_bytes()).collect();
    Some(template.replace(URL_PLACEHOLDER, &encoded))
}

fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}
