//! Library API integration tests
use pagelift_core::*;
use rstest::rstest;
use serde_json::{Value, json};
use std::io::Write;
use url::Url;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

struct FixturePage(String);

impl PageSource for FixturePage {
    async fn fetch(&self, _url: &Url) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Fails with "model not found" for everything except `live`.
struct FixtureModel {
    live: &'static str,
    reply: String,
}

impl ModelBackend for FixtureModel {
    async fn respond(&self, model: &str, _request: &ModelRequest) -> std::result::Result<Value, ModelError> {
        if model == self.live {
            Ok(json!({ "output": [{ "content": [{ "type": "output_text", "text": self.reply }] }] }))
        } else {
            Err(ModelError::Status { status: 404, message: format!("The model `{model}` does not exist") })
        }
    }
}

fn full_reply() -> String {
    let fixture: Value = serde_json::from_str(&read_fixture("report_full.json")).unwrap();
    json!({
        "score": fixture["score"],
        "summary": fixture["summary"],
        "key_findings": fixture["key_findings"],
        "quick_wins": fixture["quick_wins"],
        "prioritized_backlog": fixture["prioritized_backlog"],
        "content_audit": fixture["content_audit"],
        "copy_suggestions": fixture["copy_suggestions"],
    })
    .to_string()
}

fn analyzer(page: &str, live: &'static str, reply: String) -> Analyzer<FixturePage, FixtureModel> {
    let config = AnalyzerConfig::builder()
        .fallback_models(vec!["gpt-a".to_string(), "gpt-b".to_string(), "gpt-c".to_string()])
        .build();
    Analyzer::new(FixturePage(read_fixture(page)), FixtureModel { live, reply }, config)
}

#[rstest]
#[case("example.com", "https://example.com/")]
#[case("  www.example.com/pricing  ", "https://www.example.com/pricing")]
#[case("http://example.com", "http://example.com/")]
#[case("HTTPS://Example.com/a?b=c", "https://example.com/a?b=c")]
fn test_normalize_url(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(normalize_url(input).unwrap().as_str(), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("ftp://example.com")]
#[case("http://")]
fn test_normalize_url_rejects(#[case] input: &str) {
    let err = normalize_url(input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_report_url_as_typed() {
    assert_eq!(report_url("http://example.com").unwrap(), "http://example.com");
    assert_eq!(report_url("acme.test").unwrap(), "https://acme.test");
}

#[test]
fn test_require_http_url() {
    assert!(require_http_url("https://example.com").is_ok());
    assert!(matches!(require_http_url("example.com"), Err(PageliftError::InvalidUrl(_))));
}

#[test]
fn test_extract_landing_fixture() {
    let extracted = extract_text(&read_fixture("landing.html"), &ExtractConfig::default());

    assert!(extracted.text.contains("Funnel analytics built for product teams"));
    assert!(extracted.text.contains("Starter $29 per month"));
    assert!(!extracted.text.contains("dataLayer"));
    assert!(!extracted.text.contains("script text must be ignored"));
    assert!(!extracted.text.contains("color: #222"));
    assert!(!extracted.text.contains('<'));
    assert!(!extracted.truncated);
}

#[test]
fn test_extract_truncates_to_budget() {
    let config = ExtractConfig { max_chars: 40 };
    let extracted = extract_text(&read_fixture("landing.html"), &config);

    assert!(extracted.truncated);
    assert!(extracted.text.chars().count() <= 40);
    assert!(extracted.original_chars > 40);
}

#[test]
fn test_extract_empty_fixture() {
    assert!(extract_text(&read_fixture("empty.html"), &ExtractConfig::default()).is_empty());
}

#[test]
fn test_sections_landing_fixture() {
    let text = extract_text(&read_fixture("landing.html"), &ExtractConfig::default());
    let flags = detect_sections(&text.text);

    assert!(flags.hero);
    assert!(flags.pricing);
    assert!(flags.faq);
    assert!(flags.social_proof);
    assert!(flags.features);
    assert!(flags.trust);
    assert!(flags.contact);
    assert!(!flags.value_proposition);
    assert_eq!(flags.missing(), vec![Section::ValueProposition]);
}

#[test]
fn test_sections_bare_fixture() {
    let text = extract_text(&read_fixture("bare.html"), &ExtractConfig::default());
    assert_eq!(detect_sections(&text.text), SectionFlags::default());
}

#[test]
fn test_meta_landing_fixture() {
    let meta = PageMeta::from_html(&read_fixture("landing.html"));

    assert_eq!(meta.h1.as_deref(), Some("Funnel analytics built for product teams"));
    assert_eq!(meta.description.as_deref(), Some("See where visitors drop off and fix it in minutes."));
    assert!(meta.ctas.contains(&"Start free trial".to_string()));
    assert!(meta.ctas.contains(&"Choose plan".to_string()));
}

#[test]
fn test_fixture_reports_deserialize() {
    let free: Report = serde_json::from_str(&read_fixture("report_free.json")).unwrap();
    assert_eq!(free.mode, Mode::Free);
    assert!(free.prioritized_backlog.is_empty());
    assert_eq!(free.key_findings[0].impact, Impact::High);

    let full: Report = serde_json::from_str(&read_fixture("report_full.json")).unwrap();
    assert_eq!(full.mode, Mode::Full);
    assert_eq!(full.content_audit[0].status, AuditStatus::Weak);
    assert_eq!(full.copy_suggestions[0].priority, Priority::High);
}

#[tokio::test]
async fn test_full_analysis_with_fallback() {
    let analyzer = analyzer("landing.html", "gpt-c", full_reply());
    let report = analyzer.analyze("acme.test", Mode::Full).await.unwrap();

    assert_eq!(report.url, "https://acme.test");
    assert_eq!(report.model.as_deref(), Some("gpt-c"));
    assert_eq!(report.score, 64);
    assert_eq!(report.prioritized_backlog.len(), 2);
    assert_eq!(report.content_audit.len(), 2);
    assert_eq!(report.copy_suggestions.len(), 1);
    assert!(report.sections.pricing);
    assert!(report.screenshots.hero.is_some());
}

#[tokio::test]
async fn test_free_analysis_drops_full_panels() {
    let analyzer = analyzer("landing.html", "gpt-a", full_reply());
    let report = analyzer.analyze("acme.test", Mode::Free).await.unwrap();

    assert_eq!(report.mode, Mode::Free);
    assert!(report.prioritized_backlog.is_empty());
    assert!(report.content_audit.is_empty());
    assert!(report.copy_suggestions.is_empty());
    assert!(!report.key_findings.is_empty());
}

#[tokio::test]
async fn test_analysis_rejects_prose() {
    let analyzer = analyzer("landing.html", "gpt-a", "Looks good to me!".to_string());
    let err = analyzer.analyze("acme.test", Mode::Free).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parsing);
}

#[tokio::test]
async fn test_analysis_exhausts_models() {
    let analyzer = analyzer("landing.html", "nobody", full_reply());
    match analyzer.analyze("acme.test", Mode::Free).await.unwrap_err() {
        PageliftError::ModelsExhausted { tried, .. } => assert_eq!(tried, vec!["gpt-a", "gpt-b", "gpt-c"]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_relay_stream_over_fixture() {
    let analyzer = std::sync::Arc::new(analyzer("landing.html", "gpt-b", full_reply()));
    let relay = Relay::new(analyzer, RelayConfig::default());

    let mut rx = relay.spawn("acme.test".to_string(), Mode::Full);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    match events.last() {
        Some(StreamEvent::Result(report)) => assert_eq!(report.model.as_deref(), Some("gpt-b")),
        other => panic!("expected result, got {other:?}"),
    }
}

#[tokio::test]
async fn test_augment_copy_fetches_meta() {
    let reply = json!({ "rows": [
        { "field": "cta", "current": "Choose plan", "recommended": "Start my 14-day trial", "priority": "HIGH", "lift_percent": "7%" },
        { "field": "h1", "current": "", "recommended": "  ", "priority": "low", "lift_percent": 3 }
    ] })
    .to_string();
    let analyzer = analyzer("landing.html", "gpt-a", reply);

    let rows = analyzer.augment_copy("acme.test", None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].priority, Priority::High);
    assert_eq!(rows[0].lift_percent, 7);
}

#[cfg(feature = "pdf")]
#[test]
fn test_pdf_from_fixture() {
    let report: Report = serde_json::from_str(&read_fixture("report_full.json")).unwrap();
    let bytes = render_pdf(&report, &PdfLayout::default()).unwrap();

    assert!(bytes.starts_with(b"%PDF-"));
    assert!(bytes.windows(report.url.len()).any(|w| w == report.url.as_bytes()));
    assert_eq!(export_filename(&report.url), "cro-report-acme.test.pdf");
}

#[test]
fn test_fetch_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "<h1>Hello</h1>").unwrap();

    let html = fetch_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(html, "<h1>Hello</h1>");
    assert!(matches!(fetch_file("/definitely/not/here.html"), Err(PageliftError::FileNotFound(_))));
}

#[test]
fn test_grade_fallback_formula() {
    let findings = vec![
        Finding { title: "a".into(), impact: Impact::High, recommendation: String::new() },
        Finding { title: "b".into(), impact: Impact::Low, recommendation: String::new() },
    ];
    assert_eq!(grade(None, &findings, &[]), 82);
    assert_eq!(grade(Some(101.4), &findings, &[]), 100);
    assert_eq!(grade(Some(f64::NAN), &[], &[]), 100);
}
