//! HTTP API integration tests against a local mock upstream.
//!
//! The upstream serves the landing page fixture, a 404 page, an
//! OpenAI-compatible `/v1/responses` endpoint that only knows the model
//! `live`, a PNG screenshot and an email sink.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use pagelift_server::ServerArgs;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

const PNG: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

#[derive(Clone, Default)]
struct Upstream {
    emails: Arc<Mutex<Vec<Value>>>,
    models: Arc<Mutex<Vec<String>>>,
}

fn report_reply() -> String {
    json!({
        "score": 66,
        "summary": "Clear hero, thin proof.",
        "key_findings": [{ "title": "One testimonial", "impact": "high", "recommendation": "Add logos" }],
        "quick_wins": ["Move the demo button up"],
        "prioritized_backlog": [{ "title": "Rewrite hero", "impact": "high", "effort": "low", "eta_days": 0 }],
        "content_audit": [{ "section": "Hero", "status": "weak", "rationale": "Vague", "suggestions": [] }],
        "copy_suggestions": []
    })
    .to_string()
}

fn copy_reply() -> String {
    let rows: Vec<Value> = (0..7)
        .map(|i| json!({ "field": format!("cta {i}"), "current": "Go", "recommended": "Start my trial", "priority": "high", "lift_percent": 40 }))
        .collect();
    json!({ "rows": rows }).to_string()
}

async fn model_endpoint(State(upstream): State<Upstream>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let model = body["model"].as_str().unwrap_or_default().to_string();
    upstream.models.lock().unwrap().push(model.clone());

    if model != "live" {
        let error = json!({ "error": { "message": format!("The model `{model}` does not exist"), "code": "model_not_found" } });
        return (StatusCode::NOT_FOUND, Json(error));
    }

    let text = match body["text"]["format"]["name"].as_str() {
        Some("cro_report") => report_reply(),
        Some("cro_copy") => copy_reply(),
        _ => "OK".to_string(),
    };
    (StatusCode::OK, Json(json!({ "output": [{ "type": "message", "content": [{ "type": "output_text", "text": text }] }] })))
}

async fn email_endpoint(State(upstream): State<Upstream>, Json(body): Json<Value>) -> Json<Value> {
    upstream.emails.lock().unwrap().push(body);
    Json(json!({ "id": "em_1" }))
}

async fn spawn_upstream() -> (SocketAddr, Upstream) {
    let upstream = Upstream::default();
    let landing = std::fs::read_to_string("../../tests/fixtures/landing.html").unwrap();

    let app = Router::new()
        .route("/page", get(move || {
            let html = landing.clone();
            async move { Html(html) }
        }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "no such page") }))
        .route("/shot.png", get(|| async { ([(header::CONTENT_TYPE, "image/png")], PNG.to_vec()) }))
        .route("/v1/responses", post(model_endpoint))
        .route("/emails", post(email_endpoint))
        .with_state(upstream.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, upstream)
}

async fn build_app(with_mail: bool) -> (Router, Upstream, SocketAddr) {
    let (addr, upstream) = spawn_upstream().await;
    let mut args = vec![
        "pagelift-server".to_string(),
        "--api-key".to_string(),
        "sk-test".to_string(),
        "--base-url".to_string(),
        format!("http://{addr}/v1"),
        "--model".to_string(),
        "gone-1".to_string(),
        "--fallback-models".to_string(),
        "gone-2,live".to_string(),
        "--screenshot-template".to_string(),
        format!("http://{addr}/shot.png?u={{url}}"),
        "--mail-endpoint".to_string(),
        format!("http://{addr}/emails"),
    ];
    // blank overrides any RESEND_API_KEY in the environment
    let mail_key = if with_mail { "re_test" } else { "" };
    args.extend(["--mail-api-key".to_string(), mail_key.to_string()]);
    let args = ServerArgs::parse_from(args);
    (pagelift_server::app(&args).unwrap(), upstream, addr)
}

async fn test_app() -> (Router, Upstream, SocketAddr) {
    build_app(true).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Splits an event-stream body into `(event, data)` pairs.
fn parse_events(body: &[u8]) -> Vec<(String, Value)> {
    String::from_utf8_lossy(body)
        .split("\n\n")
        .filter_map(|frame| {
            let mut name = None;
            let mut data = String::new();
            for line in frame.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    name = Some(value.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push_str(value.trim_start());
                }
            }
            Some((name?, serde_json::from_str(&data).ok()?))
        })
        .collect()
}

fn assert_single_terminal(events: &[(String, Value)]) {
    let terminal = events.iter().filter(|(name, _)| name == "result" || name == "error").count();
    assert_eq!(terminal, 1, "events: {events:?}");
    let (last, _) = events.last().unwrap();
    assert!(last == "result" || last == "error");

    let mut previous = 0;
    for (name, data) in events {
        if name == "progress" {
            let value = data["value"].as_u64().unwrap();
            assert!(value >= previous && value < 100);
            previous = value;
        }
    }
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = test_app().await;
    let (status, _, body) = send(app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["healthy"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_analyze_falls_back_to_third_model() {
    let (app, upstream, addr) = test_app().await;
    let request = post_json("/api/analyze", json!({ "url": format!("http://{addr}/page"), "mode": "full" }));
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["model"], "live");
    assert_eq!(report["score"], 66);
    assert_eq!(report["mode"], "full");
    assert_eq!(report["prioritized_backlog"][0]["eta_days"], 1);
    assert_eq!(report["sections"]["pricing"], true);
    assert_eq!(upstream.models.lock().unwrap().as_slice(), ["gone-1", "gone-2", "live"]);
}

#[tokio::test]
async fn test_analyze_page_404_is_bad_gateway() {
    let (app, upstream, addr) = test_app().await;
    let request = post_json("/api/analyze", json!({ "url": format!("http://{addr}/missing") }));
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("404"));
    assert!(upstream.models.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_validation() {
    let (app, _, _) = test_app().await;
    let (status, _, body) = send(app.clone(), post_json("/api/analyze", json!({ "url": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(serde_json::from_slice::<Value>(&body).unwrap()["error"].is_string());

    let (status, _, _) = send(app.clone(), post_json("/api/analyze", json!({ "url": "a.test", "mode": "gold" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_body = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, _) = send(app, bad_body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stream_success() {
    let (app, _, addr) = test_app().await;
    let (status, headers, body) = send(app, get_request(&format!("/api/analyze-stream?url=http://{addr}/page&mode=free"))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/event-stream"));
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");

    let events = parse_events(&body);
    assert_single_terminal(&events);
    let (name, report) = events.last().unwrap();
    assert_eq!(name, "result");
    assert_eq!(report["model"], "live");
    assert_eq!(report["mode"], "free");
    assert_eq!(report["prioritized_backlog"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_stream_page_404_emits_error_only() {
    let (app, _, addr) = test_app().await;
    let request = post_json("/api/analyze-stream", json!({ "url": format!("http://{addr}/missing") }));
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let events = parse_events(&body);
    assert_single_terminal(&events);
    assert!(!events.iter().any(|(name, _)| name == "result"));
    let (name, data) = events.last().unwrap();
    assert_eq!(name, "error");
    assert!(data["message"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_augment_copy_caps_rows_and_lift() {
    let (app, _, _) = test_app().await;
    let request = post_json(
        "/api/augment-copy",
        json!({ "url": "acme.test", "meta": { "title": "Acme", "h1": "Ship faster", "ctas": ["Go"] } }),
    );
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["ok"], true);
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r["lift_percent"] == 12));
}

#[tokio::test]
async fn test_export_pdf_download() {
    let (app, _, _) = test_app().await;
    let report: Value = serde_json::from_str(&std::fs::read_to_string("../../tests/fixtures/report_free.json").unwrap()).unwrap();
    let (status, headers, body) = send(app, post_json("/api/export-pdf", json!({ "report": report }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().contains("cro-report-acme.test.pdf"));
    assert!(body.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_export_pdf_email() {
    let (app, upstream, _) = test_app().await;
    let report: Value = serde_json::from_str(&std::fs::read_to_string("../../tests/fixtures/report_full.json").unwrap()).unwrap();
    let request = post_json("/api/export-pdf", json!({ "report": report, "email": "ana@example.com" }));
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "ok": true, "emailed": true }));

    let emails = upstream.emails.lock().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0]["to"][0], "ana@example.com");
    assert_eq!(emails[0]["attachments"][0]["filename"], "cro-report-acme.test.pdf");
}

#[tokio::test]
async fn test_export_pdf_email_without_mail_key_downloads() {
    let (app, upstream, _) = build_app(false).await;
    let report: Value = serde_json::from_str(&std::fs::read_to_string("../../tests/fixtures/report_full.json").unwrap()).unwrap();
    let request = post_json("/api/export-pdf", json!({ "report": report, "email": "ana@example.com" }));
    let (status, headers, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert!(body.starts_with(b"%PDF-"));
    assert!(upstream.emails.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_screenshot() {
    let (app, _, addr) = test_app().await;

    let (status, _, body) = send(app.clone(), get_request("/api/screenshot?url=acme.test")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("http"));

    let (status, headers, body) = send(app, get_request(&format!("/api/screenshot?url=http://{addr}/page"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(&body[..], &PNG[..]);
}

#[tokio::test]
async fn test_model_probe() {
    let (app, _, _) = test_app().await;
    let (status, _, body) = send(app, get_request("/api/models/probe")).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["chosen_model"], "live");
    assert_eq!(body["tried"].as_array().unwrap().len(), 3);
    assert_eq!(body["tried"][0]["status"], 404);
}

#[tokio::test]
async fn test_cors_any_origin() {
    let (app, _, _) = test_app().await;
    let request = Request::builder().uri("/health").header(header::ORIGIN, "https://app.test").body(Body::empty()).unwrap();
    let (_, headers, _) = send(app, request).await;

    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
