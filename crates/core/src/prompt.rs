//! Prompts and strict JSON schemas sent to the model.
//!
//! Strict structured output requires every property to be listed in
//! `required` and `additionalProperties: false` on every object.

use serde_json::{Value, json};
use url::Url;

use crate::extract::ExtractedText;
use crate::meta::PageMeta;
use crate::model::ModelRequest;
use crate::report::Mode;
use crate::sections::SectionFlags;

pub const REPORT_SCHEMA_NAME: &str = "cro_report";
pub const COPY_SCHEMA_NAME: &str = "cro_copy";

const SYSTEM_PROMPT: &str = "You are a senior conversion-rate-optimization consultant auditing a landing page. \
Judge only what the supplied page text shows. Be specific to this page: quote its copy, name its sections. \
Findings are ordered by impact. Quick wins must be doable in under a day. \
Score the page 0-100 for how well it converts a first-time visitor. Answer with JSON matching the schema.";

const COPY_SYSTEM_PROMPT: &str = "You are a conversion copywriter. Rewrite the page's most visible copy \
(title, meta description, H1, primary CTAs) to be clearer and more specific. Keep each recommendation \
under 90 characters for CTAs and under 160 for descriptions. Estimate lift_percent between 0 and 12. \
Return at most 5 rows. Answer with JSON matching the schema.";

fn object(properties: Value) -> Value {
    let required: Vec<Value> = properties
        .as_object()
        .map(|p| p.keys().map(|k| Value::String(k.clone())).collect())
        .unwrap_or_default();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn string_enum(values: &[&str]) -> Value {
    json!({ "type": "string", "enum": values })
}

fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

fn copy_row_schema() -> Value {
    object(json!({
        "field": { "type": "string" },
        "current": { "type": "string" },
        "recommended": { "type": "string" },
        "priority": string_enum(&["low", "med", "high"]),
        "lift_percent": { "type": "integer", "description": "estimated lift, 0 to 12" },
    }))
}

/// Strict schema for a report in `mode`.
pub fn report_schema(mode: Mode) -> Value {
    let finding = object(json!({
        "title": { "type": "string" },
        "impact": string_enum(&["high", "medium", "low"]),
        "recommendation": { "type": "string" },
    }));

    let mut properties = json!({
        "score": { "type": "integer", "description": "0 to 100" },
        "summary": { "type": "string" },
        "key_findings": array_of(finding),
        "quick_wins": array_of(json!({ "type": "string" })),
    });

    if mode == Mode::Full {
        let backlog = object(json!({
            "title": { "type": "string" },
            "impact": string_enum(&["high", "medium", "low"]),
            "effort": string_enum(&["high", "medium", "low"]),
            "eta_days": { "type": "integer", "description": "working days, at least 1" },
        }));
        let audit = object(json!({
            "section": { "type": "string" },
            "status": string_enum(&["ok", "weak", "missing"]),
            "rationale": { "type": "string" },
            "suggestions": array_of(json!({ "type": "string" })),
        }));

        properties["prioritized_backlog"] = array_of(backlog);
        properties["content_audit"] = array_of(audit);
        properties["copy_suggestions"] = array_of(copy_row_schema());
    }

    object(properties)
}

/// Strict schema for the copy-augmentation call.
pub fn copy_schema() -> Value {
    object(json!({ "rows": array_of(copy_row_schema()) }))
}

fn describe_meta(meta: &PageMeta) -> String {
    let mut out = String::new();
    out.push_str(&format!("Title: {}\n", meta.title.as_deref().unwrap_or("(none)")));
    out.push_str(&format!("Meta description: {}\n", meta.description.as_deref().unwrap_or("(none)")));
    out.push_str(&format!("H1: {}\n", meta.h1.as_deref().unwrap_or("(none)")));
    if meta.ctas.is_empty() {
        out.push_str("CTAs: (none found)\n");
    } else {
        out.push_str(&format!("CTAs: {}\n", meta.ctas.join(" | ")));
    }
    out
}

fn describe_sections(flags: &SectionFlags) -> String {
    let names = |v: Vec<crate::sections::Section>| v.iter().map(|s| s.label()).collect::<Vec<_>>().join(", ");
    let present = flags.present();
    let missing = flags.missing();
    format!(
        "Detected sections: {}\nNot detected: {}\n",
        if present.is_empty() { "none".to_string() } else { names(present) },
        if missing.is_empty() { "none".to_string() } else { names(missing) },
    )
}

/// Builds the analysis request for `url`.
pub fn report_request(
    url: &Url, meta: &PageMeta, sections: &SectionFlags, text: &ExtractedText, mode: Mode, max_output_tokens: u32,
) -> ModelRequest {
    let mut user = format!("URL: {url}\nReport tier: {mode}\n");
    user.push_str(&describe_meta(meta));
    user.push_str(&describe_sections(sections));
    if mode == Mode::Full {
        user.push_str(
            "Include a prioritized backlog with effort and eta_days, a content audit of every section \
             (ok/weak/missing), and up to 5 copy_suggestions.\n",
        );
    } else {
        user.push_str("Return at most 3 key findings and 3 quick wins.\n");
    }
    if text.truncated {
        user.push_str(&format!(
            "Page text (first {} of {} characters):\n",
            text.text.chars().count(),
            text.original_chars
        ));
    } else {
        user.push_str("Page text:\n");
    }
    user.push_str(&text.text);

    ModelRequest {
        system: SYSTEM_PROMPT.to_string(),
        user,
        schema_name: REPORT_SCHEMA_NAME.to_string(),
        schema: Some(report_schema(mode)),
        max_output_tokens,
    }
}

/// Builds the copy-augmentation request.
pub fn copy_request(url: &Url, meta: &PageMeta, max_output_tokens: u32) -> ModelRequest {
    let mut user = format!("URL: {url}\n");
    user.push_str(&describe_meta(meta));

    ModelRequest {
        system: COPY_SYSTEM_PROMPT.to_string(),
        user,
        schema_name: COPY_SCHEMA_NAME.to_string(),
        schema: Some(copy_schema()),
        max_output_tokens,
    }
}
