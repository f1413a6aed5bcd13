//! Regex-based visible-text extraction.
//!
//! This is deliberately not an HTML parser: the model only needs a rough,
//! bounded transcript of what a visitor reads. Non-content blocks and comments
//! are dropped, block boundaries become spaces, entities are decoded, and the
//! result is truncated to keep model input size predictable.

use std::sync::LazyLock;

use regex::Regex;

/// Default character budget for model input.
pub const DEFAULT_MAX_CHARS: usize = 18_000;

static NON_CONTENT_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "noscript", "svg", "template", "head"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect()
});

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static BLOCK_BOUNDARIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(p|div|section|article|header|footer|nav|main|aside|h[1-6]|li|ul|ol|tr|td|th|table|br|hr|button|form|label|blockquote)\b[^>]*>").unwrap()
});

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static NUMERIC_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Configuration for text extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Maximum number of characters kept after whitespace collapsing.
    pub max_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { max_chars: DEFAULT_MAX_CHARS }
    }
}

/// Visible text pulled out of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Collapsed, possibly truncated text.
    pub text: String,
    /// Whether the budget cut the text short.
    pub truncated: bool,
    /// Character count before truncation.
    pub original_chars: usize,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Strips markup from `html` and returns bounded, whitespace-collapsed text.
///
/// ```rust
/// use pagelift_core::{ExtractConfig, extract_text};
///
/// let html = "<html><head><title>x</title></head><body><h1>Ship&nbsp;faster</h1><script>track()</script><p>Plans from $9</p></body></html>";
/// let extracted = extract_text(html, &ExtractConfig::default());
/// assert_eq!(extracted.text, "Ship faster Plans from $9");
/// ```
pub fn extract_text(html: &str, config: &ExtractConfig) -> ExtractedText {
    let mut working = COMMENTS.replace_all(html, " ").into_owned();

    for block in NON_CONTENT_BLOCKS.iter() {
        working = block.replace_all(&working, " ").into_owned();
    }

    working = BLOCK_BOUNDARIES.replace_all(&working, " ").into_owned();
    working = TAGS.replace_all(&working, "").into_owned();

    let decoded = decode_entities(&working);
    let collapsed = WHITESPACE.replace_all(&decoded, " ").trim().to_string();

    truncate_chars(collapsed, config.max_chars)
}

fn truncate_chars(text: String, max_chars: usize) -> ExtractedText {
    let original_chars = text.chars().count();
    if original_chars <= max_chars {
        return ExtractedText { text, truncated: false, original_chars };
    }

    let cut = text.char_indices().nth(max_chars).map(|(idx, _)| idx).unwrap_or(text.len());
    ExtractedText { text: text[..cut].trim_end().to_string(), truncated: true, original_chars }
}

/// Decodes the handful of named entities landing pages actually use, plus numeric ones.
pub fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&rdquo;", "\"")
        .replace("&ldquo;", "\"")
        .replace("&copy;", "(c)");

    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32).map(String::from).unwrap_or_default()
    });

    // `&amp;` last so "&amp;lt;" stays literal text.
    numeric.replace("&amp;", "&")
}
