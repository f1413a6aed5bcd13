//! User-supplied URL handling.
//!
//! Visitors type URLs the way they read them on a billboard: `example.com`,
//! ` www.example.com/pricing `, sometimes with a scheme. [`normalize_url`]
//! turns that into an absolute `http(s)` [`Url`] or an [`PageliftError::InvalidUrl`].

use url::Url;

use crate::{PageliftError, Result};

const DEFAULT_SCHEME: &str = "https://";

/// Trims the input, prefixes `https://` when no scheme is present, and parses it.
///
/// Inputs that already carry `http://` or `https://` are left untouched apart
/// from trimming. Any other scheme, an empty input, or a result without a host
/// is rejected.
///
/// ```rust
/// use pagelift_core::normalize_url;
///
/// assert_eq!(normalize_url("example.com").unwrap().as_str(), "https://example.com/");
/// assert_eq!(normalize_url("http://example.com/a").unwrap().as_str(), "http://example.com/a");
/// assert!(normalize_url("   ").is_err());
/// ```
pub fn normalize_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PageliftError::InvalidUrl("a URL is required".to_string()));
    }

    let candidate = if has_scheme(trimmed) { trimmed.to_string() } else { format!("{DEFAULT_SCHEME}{trimmed}") };

    let url = Url::parse(&candidate).map_err(|e| PageliftError::InvalidUrl(format!("{trimmed}: {e}")))?;
    ensure_web_url(url, trimmed)
}

/// The URL string a report carries for `input`.
///
/// Scheme-bearing input is kept exactly as typed (trimmed); anything else
/// gets `https://` prepended. [`normalize_url`] must accept the input.
pub fn report_url(input: &str) -> Result<String> {
    normalize_url(input)?;
    let trimmed = input.trim();
    Ok(if has_scheme(trimmed) { trimmed.to_string() } else { format!("{DEFAULT_SCHEME}{trimmed}") })
}

/// Parses a URL that must already carry an `http` or `https` scheme.
///
/// Used where guessing a scheme would hide a caller bug, such as the
/// screenshot endpoint.
pub fn require_http_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(PageliftError::InvalidUrl(
            "URL must include a scheme (http:// or https://)".to_string(),
        ));
    }
    let url = Url::parse(trimmed).map_err(|e| PageliftError::InvalidUrl(format!("{trimmed}: {e}")))?;
    ensure_web_url(url, trimmed)
}

/// Filesystem-safe host label for a report URL, used in export filenames.
///
/// Falls back to `"site"` when the URL has no usable host.
pub fn report_host(url: &str) -> String {
    let host = normalize_url(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_ascii_lowercase()))
        .unwrap_or_default();

    let cleaned: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '-' || c == '.');

    if cleaned.is_empty() { "site".to_string() } else { cleaned.to_string() }
}

fn has_scheme(input: &str) -> bool {
    match input.find("://") {
        Some(idx) => {
            let scheme = &input[..idx];
            !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn ensure_web_url(url: Url, original: &str) -> Result<Url> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PageliftError::InvalidUrl(format!(
            "{original}: only http and https URLs can be analyzed"
        )));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(PageliftError::InvalidUrl(format!("{original}: URL has no host"))),
    }
}
