//! The CRO report and the raw model output it is assembled from.
//!
//! Model output is parsed leniently: enum-ish strings are matched
//! case-insensitively with a few synonyms, and missing arrays default to
//! empty. Anything that is not JSON, or is JSON of the wrong shape, is a
//! hard [`PageliftError::InvalidModelOutput`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::copy::CopyRow;
use crate::meta::PageMeta;
use crate::screenshot::Screenshots;
use crate::sections::SectionFlags;
use crate::{PageliftError, Result};

/// Which report tier is requested from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Score, summary, findings and quick wins.
    #[default]
    Free,
    /// Everything in `Free` plus backlog, content audit and copy suggestions.
    Full,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Free => "free",
            Mode::Full => "full",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Mode::Free),
            "full" | "paid" => Ok(Mode::Full),
            _ => Err(format!("Invalid mode: {}. Valid options: free, full", s)),
        }
    }
}

/// Expected effect of acting on a finding or backlog item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Impact {
    High,
    #[default]
    Medium,
    Low,
}

impl From<String> for Impact {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" | "critical" | "major" | "h" => Impact::High,
            "low" | "minor" | "l" => Impact::Low,
            _ => Impact::Medium,
        }
    }
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::High => "high",
            Impact::Medium => "medium",
            Impact::Low => "low",
        }
    }
}

/// Implementation cost of a backlog item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Effort {
    High,
    #[default]
    Medium,
    Low,
}

impl From<String> for Effort {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" | "large" | "l" | "hard" => Effort::High,
            "low" | "small" | "s" | "easy" => Effort::Low,
            _ => Effort::Medium,
        }
    }
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::High => "high",
            Effort::Medium => "medium",
            Effort::Low => "low",
        }
    }
}

/// Verdict for one audited page section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AuditStatus {
    Ok,
    #[default]
    Weak,
    Missing,
}

impl From<String> for AuditStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "ok" | "good" | "strong" | "present" => AuditStatus::Ok,
            "missing" | "absent" | "none" => AuditStatus::Missing,
            _ => AuditStatus::Weak,
        }
    }
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Ok => "ok",
            AuditStatus::Weak => "weak",
            AuditStatus::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAuditItem {
    pub section: String,
    #[serde(default)]
    pub status: AuditStatus,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogItem {
    pub title: String,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub effort: Effort,
    #[serde(default)]
    pub eta_days: Option<u32>,
}

/// A finished conversion report.
///
/// Built once per analysis and never mutated after it is emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_findings: Vec<Finding>,
    #[serde(default)]
    pub quick_wins: Vec<String>,
    #[serde(default)]
    pub prioritized_backlog: Vec<BacklogItem>,
    #[serde(default)]
    pub content_audit: Vec<ContentAuditItem>,
    #[serde(default)]
    pub copy_suggestions: Vec<CopyRow>,
    #[serde(default)]
    pub screenshots: Screenshots,
    #[serde(default)]
    pub sections: SectionFlags,
    #[serde(default)]
    pub mode: Mode,
    /// Identifier of the model that produced the report.
    #[serde(default)]
    pub model: Option<String>,
}

/// What the model is asked to return, before grading and assembly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawReport {
    #[serde(default)]
    pub score: Option<f64>,
    pub summary: String,
    #[serde(default)]
    pub key_findings: Vec<Finding>,
    #[serde(default)]
    pub quick_wins: Vec<String>,
    #[serde(default)]
    pub prioritized_backlog: Vec<BacklogItem>,
    #[serde(default)]
    pub content_audit: Vec<ContentAuditItem>,
    #[serde(default)]
    pub copy_suggestions: Vec<CopyRow>,
}

impl RawReport {
    /// Parses the model's generated text. Non-JSON is never partially accepted.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = strip_code_fence(text.trim());
        if trimmed.is_empty() {
            return Err(PageliftError::InvalidModelOutput("empty response".to_string()));
        }
        serde_json::from_str(trimmed).map_err(|e| PageliftError::InvalidModelOutput(format!("not valid report JSON: {e}")))
    }
}

/// Inputs gathered by the analyzer that are not produced by the model.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub url: String,
    pub meta: PageMeta,
    pub sections: SectionFlags,
    pub screenshots: Screenshots,
    pub mode: Mode,
    pub model: Option<String>,
}

impl Report {
    /// Grades and assembles a report. Free reports never carry full-only panels.
    pub fn assemble(raw: RawReport, ctx: ReportContext) -> Self {
        let score = grade(raw.score, &raw.key_findings, &raw.content_audit);

        let (prioritized_backlog, content_audit, copy_suggestions) = match ctx.mode {
            Mode::Free => (Vec::new(), Vec::new(), Vec::new()),
            Mode::Full => (
                raw.prioritized_backlog.into_iter().map(BacklogItem::normalized).collect(),
                raw.content_audit,
                crate::copy::normalize_rows(raw.copy_suggestions),
            ),
        };

        Self {
            url: ctx.url,
            title: ctx.meta.title,
            score,
            summary: raw.summary.trim().to_string(),
            key_findings: raw.key_findings.into_iter().filter(|f| !f.title.trim().is_empty()).collect(),
            quick_wins: raw.quick_wins.into_iter().map(|w| w.trim().to_string()).filter(|w| !w.is_empty()).collect(),
            prioritized_backlog,
            content_audit,
            copy_suggestions,
            screenshots: ctx.screenshots,
            sections: ctx.sections,
            mode: ctx.mode,
            model: ctx.model,
        }
    }

    pub fn score_band(&self) -> &'static str {
        match self.score {
            80..=100 => "strong",
            60..=79 => "fair",
            40..=59 => "weak",
            _ => "poor",
        }
    }
}

impl BacklogItem {
    fn normalized(mut self) -> Self {
        self.eta_days = self.eta_days.map(|d| d.max(1));
        self
    }
}

/// The single grading formula.
///
/// A finite model score is rounded and clamped to 0-100. Without one, the score
/// is derived from penalties: 15/8/3 per high/medium/low finding and 10/5 per
/// missing/weak audited section, floored at zero.
pub fn grade(model_score: Option<f64>, findings: &[Finding], audit: &[ContentAuditItem]) -> u8 {
    if let Some(score) = model_score
        && score.is_finite()
    {
        return score.round().clamp(0.0, 100.0) as u8;
    }

    let finding_penalty: u32 = findings
        .iter()
        .map(|f| match f.impact {
            Impact::High => 15,
            Impact::Medium => 8,
            Impact::Low => 3,
        })
        .sum();
    let audit_penalty: u32 = audit
        .iter()
        .map(|a| match a.status {
            AuditStatus::Missing => 10,
            AuditStatus::Weak => 5,
            AuditStatus::Ok => 0,
        })
        .sum();

    100u32.saturating_sub(finding_penalty + audit_penalty) as u8
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
