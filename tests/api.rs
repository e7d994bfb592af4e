//! HTTP API tests against a scripted LLM backend.
//!
//! Every request goes through the real router (`tower::ServiceExt::oneshot`),
//! so extractors, rejections and error bodies are exercised end to end.
//! No network access and no pdfium library are needed.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use labreport_insight::server::{create_app_with_state, AppState};
use labreport_insight::{
    Completion, CompletionBackend, InsightConfig, InsightError, Prompt, ReportAnalyzer,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replies from a queue; an exhausted queue (or an `Err` entry) fails the call.
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<Completion, InsightError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(content)) => Ok(Completion {
                content,
                input_tokens: 10,
                output_tokens: 5,
            }),
            Some(Err(message)) => Err(InsightError::LlmApiError {
                attempts: 1,
                message,
            }),
            None => Err(InsightError::LlmApiError {
                attempts: 1,
                message: "script exhausted".into(),
            }),
        }
    }
}

/// Route handler and analyzer logs to the test harness; `RUST_LOG` overrides.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn app(backend: Arc<ScriptedBackend>) -> (Router, Arc<AppState>) {
    init_tracing();
    let config = InsightConfig::builder()
        .max_retries(0)
        .retry_backoff_ms(1)
        .max_upload_bytes(64 * 1024)
        .build()
        .expect("valid config");
    let state = AppState::new(ReportAnalyzer::new(backend, config));
    (create_app_with_state(Arc::clone(&state)), state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "X-LABREPORT-BOUNDARY";

fn multipart_upload(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
Content-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/extract_pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

const EXTRACTION_REPLY: &str = r#"```json
{
  "Hemoglobin": { "value": 10.2, "unit": "g/dL" },
  "Fasting Glucose": { "value": 148, "unit": "mg/dL" }
}
```"#;

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app(ScriptedBackend::new(vec![]));
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["sessions"], 0);
}

// ── analyze_report ───────────────────────────────────────────────────────────

#[tokio::test]
async fn analyze_returns_test_data_and_insight() {
    let backend = ScriptedBackend::new(vec![
        Ok(EXTRACTION_REPLY),
        Ok("Hello Ramchandra,\n\nYour hemoglobin is low."),
    ]);
    let (app, _) = app(Arc::clone(&backend));

    let (status, json) = send(
        app,
        post_json(
            "/api/analyze_report",
            json!({
                "reportText": "Hemoglobin 10.2 g/dL\nFasting Glucose 148 mg/dL",
                "userProfile": {
                    "name": "Ramchandra",
                    "age": "77",
                    "gender": "Male",
                    "medicalHistory": ["diabetes", "Blood Pressure"]
                }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["testData"]["Hemoglobin"]["value"], 10.2);
    assert_eq!(json["testData"]["Fasting Glucose"]["unit"], "mg/dL");
    assert_eq!(json["insight"], "Hello Ramchandra,\n\nYour hemoglobin is low.");

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].user.contains("Fasting Glucose 148 mg/dL"));
    assert!(prompts[1].user.contains("\"medicalHistory\""));
    assert!(prompts[1].user.contains("Blood Pressure"));
}

#[tokio::test]
async fn analyze_accepts_fractional_age() {
    let backend = ScriptedBackend::new(vec![Ok(EXTRACTION_REPLY), Ok("Looks fine.")]);
    let (app, _) = app(Arc::clone(&backend));

    let (status, json) = send(
        app,
        post_json(
            "/api/analyze_report",
            json!({
                "reportText": "Hemoglobin 10.2 g/dL",
                "userProfile": { "name": "Meera", "age": 45.5, "gender": "Female" }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["insight"], "Looks fine.");
    assert!(backend.prompts()[1].user.contains("\"age\": 45.5"));
}

#[tokio::test]
async fn analyze_without_text_is_rejected() {
    let backend = ScriptedBackend::new(vec![]);
    let (app, _) = app(Arc::clone(&backend));
    let (status, json) = send(
        app,
        post_json("/api/analyze_report", json!({ "reportText": "", "userProfile": {} })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No report text provided");
    assert!(backend.prompts().is_empty());
}

#[tokio::test]
async fn analyze_without_body_is_rejected() {
    let (app, _) = app(ScriptedBackend::new(vec![]));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/analyze_report")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No data provided");
}

#[tokio::test]
async fn analyze_with_unparseable_extraction_is_500() {
    let (app, _) = app(ScriptedBackend::new(vec![Ok("I'm unable to read this report.")]));
    let (status, json) = send(
        app,
        post_json("/api/analyze_report", json!({ "reportText": "WBC 7.1" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Could not parse test values"));
}

#[tokio::test]
async fn analyze_with_provider_failure_is_500() {
    let (app, _) = app(ScriptedBackend::new(vec![Err("401 invalid API key")]));
    let (status, json) = send(
        app,
        post_json("/api/analyze_report", json!({ "reportText": "WBC 7.1" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("401 invalid API key"));
}

// ── chat ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_remembers_previous_turns_per_session() {
    let backend = ScriptedBackend::new(vec![
        Ok("\"Your glucose is above the normal fasting range.\""),
        Ok("Cutting sugary drinks is a good start."),
    ]);
    let (app, state) = app(Arc::clone(&backend));
    let context = json!({
        "testData": { "Fasting Glucose": { "value": 148, "unit": "mg/dL" } },
        "userProfile": { "name": "Asha", "age": 52, "gender": "Female", "medicalHistory": [] },
        "sessionId": "chat-42",
        "reportText": "ignored"
    });

    let mut first = context.clone();
    first["message"] = json!("Is my glucose high?");
    let (status, json) = send(app.clone(), post_json("/api/chat", first)).await;
    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["response"], "Your glucose is above the normal fasting range.");
    assert_eq!(json["sessionId"], "chat-42");

    let mut second = context.clone();
    second["message"] = json!("What should I change?");
    let (status, json) = send(app, post_json("/api/chat", second)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "Cutting sugary drinks is a good start.");

    let prompts = backend.prompts();
    let last = &prompts[1].user;
    assert!(last.contains("Patient: Asha\nAge: 52\nGender: Female"));
    assert!(!last.contains("Medical History"));
    assert!(last.contains("Fasting Glucose: 148 mg/dL"));
    assert!(last.contains(
        "Human: Is my glucose high?\nAI: Your glucose is above the normal fasting range."
    ));
    assert!(last.contains("Patient question: What should I change?"));
    assert_eq!(state.analyzer.sessions().history("chat-42").await.len(), 2);
}

#[tokio::test]
async fn chat_defaults_session_id() {
    let (app, _) = app(ScriptedBackend::new(vec![Ok("Sure.")]));
    let (status, json) = send(app, post_json("/api/chat", json!({ "message": "Hi" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sessionId"], "default");
}

#[tokio::test]
async fn chat_without_message_is_rejected() {
    let (app, _) = app(ScriptedBackend::new(vec![]));
    let (status, json) = send(app, post_json("/api/chat", json!({ "sessionId": "s" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No message provided");
}

#[tokio::test]
async fn chat_failure_has_friendly_error_and_details() {
    let (app, state) = app(ScriptedBackend::new(vec![Err("quota exceeded")]));
    let (status, json) = send(
        app,
        post_json("/api/chat", json!({ "message": "Hi", "sessionId": "s1" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Sorry, I couldn't process your request");
    assert!(json["details"].as_str().unwrap().contains("quota exceeded"));
    assert!(state.analyzer.sessions().history("s1").await.is_empty());
}

#[tokio::test]
async fn delete_session_clears_transcript() {
    let (app, state) = app(ScriptedBackend::new(vec![Ok("Noted.")]));
    let (status, _) = send(
        app.clone(),
        post_json("/api/chat", json!({ "message": "Hi", "sessionId": "gone" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/chat/gone")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "sessionId": "gone", "cleared": true }));
    assert!(state.analyzer.sessions().history("gone").await.is_empty());
}

// ── extract_pdf ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_without_multipart_is_rejected() {
    let (app, _) = app(ScriptedBackend::new(vec![]));
    let (status, json) = send(app, post_json("/api/extract_pdf", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn upload_with_wrong_field_is_rejected() {
    let (app, _) = app(ScriptedBackend::new(vec![]));
    let (status, json) = send(app, multipart_upload("document", "report.pdf", b"%PDF-1.4")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn upload_without_filename_is_rejected() {
    let (app, _) = app(ScriptedBackend::new(vec![]));
    let (status, json) = send(app, multipart_upload("file", "", b"%PDF-1.4")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file selected");
}

#[tokio::test]
async fn upload_of_non_pdf_is_rejected() {
    let (app, _) = app(ScriptedBackend::new(vec![]));
    let (status, json) = send(app, multipart_upload("file", "report.pdf", b"GIF89a....")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("not a valid PDF"));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let (app, _) = app(ScriptedBackend::new(vec![]));
    let big = vec![b'a'; 128 * 1024];
    let (status, _) = send(app, multipart_upload("file", "report.pdf", &big)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
