use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::extract::decode_entities;

const MAX_CTAS: usize = 8;

/// Conversion-relevant page metadata: the copy a visitor sees first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub h1: Option<String>,
    #[serde(default)]
    pub ctas: Vec<String>,
}

impl PageMeta {
    /// Extracts title, meta description, first H1 and call-to-action labels.
    pub fn from_html(html: &str) -> Self {
        let doc = Html::parse_document(html);

        let title = first_text(&doc, "title");
        let description = meta_content(&doc, r#"meta[name="description"]"#)
            .or_else(|| meta_content(&doc, r#"meta[property="og:description"]"#));
        let h1 = first_text(&doc, "h1");
        let ctas = cta_labels(&doc);

        Self { title, description, h1, ctas }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.h1.is_none() && self.ctas.is_empty()
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn clean(text: &str) -> Option<String> {
    let collapsed = decode_entities(&text.split_whitespace().collect::<Vec<_>>().join(" "));
    let trimmed = collapsed.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn element_text(el: ElementRef<'_>) -> Option<String> {
    clean(&el.text().collect::<String>())
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel).find_map(element_text)
}

fn meta_content(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel).find_map(|el| el.value().attr("content").and_then(clean))
}

fn cta_labels(doc: &Html) -> Vec<String> {
    let Some(sel) = selector(
        r#"button, a.btn, a.button, a[class*="cta"], a[role="button"], input[type="submit"]"#,
    ) else {
        return Vec::new();
    };

    let mut labels: Vec<String> = Vec::new();
    for el in doc.select(&sel) {
        let label = element_text(el).or_else(|| el.value().attr("value").and_then(clean));
        if let Some(label) = label
            && label.chars().count() <= 60
            && !labels.iter().any(|l| l.eq_ignore_ascii_case(&label))
        {
            labels.push(label);
        }
        if labels.len() == MAX_CTAS {
            break;
        }
    }
    labels
}
