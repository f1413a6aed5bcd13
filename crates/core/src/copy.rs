//! Copy rewrite suggestions for the page's most visible text.

use serde::{Deserialize, Serialize};

use crate::{PageliftError, Result};

/// Upper bound on rows returned to callers.
pub const MAX_COPY_ROWS: usize = 5;

/// Upper bound on the estimated lift of a single rewrite, in percent.
pub const MAX_LIFT_PERCENT: u8 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    Low,
    #[default]
    Med,
    High,
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" | "h" | "critical" => Priority::High,
            "low" | "l" | "minor" => Priority::Low,
            _ => Priority::Med,
        }
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Med => "med",
            Priority::High => "high",
        }
    }
}

/// One suggested rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyRow {
    /// Which piece of copy: "title", "meta description", "h1", "cta", ...
    pub field: String,
    #[serde(default)]
    pub current: String,
    pub recommended: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient_lift")]
    pub lift_percent: u8,
}

fn lenient_lift<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match &value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(clamp_lift(number))
}

fn clamp_lift(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(MAX_LIFT_PERCENT)) as u8
}

/// Drops blank rows, clamps lift, and caps the list at [`MAX_COPY_ROWS`].
pub fn normalize_rows(rows: Vec<CopyRow>) -> Vec<CopyRow> {
    rows.into_iter()
        .filter(|r| !r.field.trim().is_empty() && !r.recommended.trim().is_empty())
        .map(|mut r| {
            r.field = r.field.trim().to_string();
            r.current = r.current.trim().to_string();
            r.recommended = r.recommended.trim().to_string();
            r.lift_percent = r.lift_percent.min(MAX_LIFT_PERCENT);
            r
        })
        .take(MAX_COPY_ROWS)
        .collect()
}

#[derive(Debug, Deserialize)]
struct CopyEnvelope {
    rows: Vec<CopyRow>,
}

/// Parses the model's copy-suggestion text into normalized rows.
pub fn parse_copy_rows(text: &str) -> Result<Vec<CopyRow>> {
    let envelope: CopyEnvelope = serde_json::from_str(text.trim())
        .map_err(|e| PageliftError::InvalidModelOutput(format!("not valid copy JSON: {e}")))?;
    Ok(normalize_rows(envelope.rows))
}
