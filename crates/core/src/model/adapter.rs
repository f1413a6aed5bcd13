//! Response-shape adapter.
//!
//! Contract: given a provider response body, return the generated text of the
//! first non-empty candidate, checking in order
//!
//! 1. a top-level `output_text` string (SDK convenience field),
//! 2. `output[*].content[*].text` where the content type is `output_text` or `text`
//!    (Responses API),
//! 3. `choices[0].message.content` (Chat Completions).
//!
//! Returns `None` when no shape yields non-blank text. The caller treats that
//! as invalid output, never as an empty report.

use serde_json::Value;

pub fn output_text(body: &Value) -> Option<String> {
    top_level(body).or_else(|| nested_output(body)).or_else(|| chat_choice(body))
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn top_level(body: &Value) -> Option<String> {
    body.get("output_text").and_then(Value::as_str).and_then(non_blank)
}

fn nested_output(body: &Value) -> Option<String> {
    let parts: Vec<&str> = body
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| {
            matches!(part.get("type").and_then(Value::as_str), Some("output_text") | Some("text") | None)
        })
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    non_blank(&parts.concat())
}

fn chat_choice(body: &Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")
        .and_then(Value::as_str)
        .and_then(non_blank)
}
