//! HTTP tests driven through the router with `oneshot`. Upload scenarios run on
//! tokio's paused clock so the completion delay costs no wall time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use truth_verify_api::clock::SystemClock;
use truth_verify_api::config::Config;
use truth_verify_api::store::models::{
    Contact, NewContact, NewVideoAnalysis, UpsertUser, User, VideoAnalysis, VideoAnalysisUpdate,
};
use truth_verify_api::store::{AnalysisStore, StoreError};
use truth_verify_api::{api, AppState};

const BOUNDARY: &str = "----truth-verify-test-boundary";

fn setup_with(config: Config) -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::in_memory(config, Arc::new(SystemClock)));
    let app = api::create_router(Arc::clone(&state));
    (state, app)
}

fn setup() -> (Arc<AppState>, Router) {
    setup_with(Config::default())
}

/// A store whose every operation fails as if its lock were poisoned.
struct BrokenStore;

#[async_trait]
impl AnalysisStore for BrokenStore {
    async fn create_contact(&self, _contact: NewContact) -> Result<Contact, StoreError> {
        Err(StoreError::Poisoned)
    }

    async fn get_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        Err(StoreError::Poisoned)
    }

    async fn get_user(&self, _id: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Poisoned)
    }

    async fn upsert_user(&self, _user: UpsertUser) -> Result<User, StoreError> {
        Err(StoreError::Poisoned)
    }

    async fn create_video_analysis(
        &self,
        _analysis: NewVideoAnalysis,
    ) -> Result<VideoAnalysis, StoreError> {
        Err(StoreError::Poisoned)
    }

    async fn get_video_analysis(&self, _id: u64) -> Result<Option<VideoAnalysis>, StoreError> {
        Err(StoreError::Poisoned)
    }

    async fn get_user_video_analyses(
        &self,
        _user_id: &str,
    ) -> Result<Vec<VideoAnalysis>, StoreError> {
        Err(StoreError::Poisoned)
    }

    async fn update_video_analysis(
        &self,
        _id: u64,
        _update: VideoAnalysisUpdate,
    ) -> Result<Option<VideoAnalysis>, StoreError> {
        Err(StoreError::Poisoned)
    }

    async fn video_analysis_count(&self) -> Result<usize, StoreError> {
        Err(StoreError::Poisoned)
    }
}

fn setup_broken() -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new(
        Config::default(),
        Arc::new(BrokenStore),
        Arc::new(SystemClock),
    ));
    let app = api::create_router(Arc::clone(&state));
    (state, app)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// One multipart part: (field name, optional (file name, content type), bytes).
type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, Vec<u8>);

fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file {
            Some((file_name, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; \
                         filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/video/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = serde_json::from_slice(&bytes).expect("Should parse JSON");
    (status, body)
}

fn valid_contact() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "company": "Analytical Engines",
        "message": "We would like a demo."
    })
}

fn is_hash(value: &Value) -> bool {
    value.as_str().is_some_and(|s| {
        s.len() == 66 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
    })
}

// =============================================================================
// Contacts
// =============================================================================

#[tokio::test]
async fn test_create_contact() {
    let (_state, app) = setup();

    let (status, body) = send(&app, json_request("POST", "/api/contacts", valid_contact())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], 1);
    assert_eq!(
        body["message"],
        "Thank you for your message! We'll get back to you within 24 hours."
    );

    let (status, body) = send(&app, json_request("POST", "/api/contacts", valid_contact())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 2);
}

#[tokio::test]
async fn test_list_contacts_in_id_order() {
    let (_state, app) = setup();

    for first_name in ["Ada", "Grace", "Linus"] {
        let mut contact = valid_contact();
        contact["firstName"] = json!(first_name);
        let (status, _) = send(&app, json_request("POST", "/api/contacts", contact)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get_request("/api/contacts")).await;
    assert_eq!(status, StatusCode::OK);

    let contacts = body.as_array().expect("bare array of contacts");
    let names: Vec<&str> = contacts
        .iter()
        .map(|c| c["firstName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ada", "Grace", "Linus"]);
    assert_eq!(contacts[0]["id"], 1);
    assert_eq!(contacts[0]["company"], "Analytical Engines");
    assert!(contacts[0]["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_contact_validation_errors() {
    let (state, app) = setup();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/contacts",
            json!({ "firstName": "Ada", "email": "not-an-email", "message": "" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Please check your form data");

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["lastName", "message", "email"]);

    assert!(state.store.get_contacts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_contact_malformed_json() {
    let (_state, app) = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/api/contacts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "body");
}

// =============================================================================
// Video upload and polling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_upload_then_poll_until_completed() {
    let (_state, app) = setup();

    let (status, body) = send(
        &app,
        multipart_request(&[("video", Some(("clip.mp4", "video/mp4")), vec![7u8; 1024])]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Video uploaded successfully. Analysis in progress..."
    );
    let id = body["analysisId"].as_u64().expect("numeric analysisId");

    let uri = format!("/api/video/analysis/{id}");
    let (status, body) = send(&app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let analysis = &body["analysis"];
    assert_eq!(analysis["analysisStatus"], "processing");
    assert_eq!(analysis["fileName"], "clip.mp4");
    assert_eq!(analysis["fileSize"], 1024);
    assert_eq!(analysis["userId"], Value::Null);
    assert_eq!(analysis["truthScore"], Value::Null);
    assert_eq!(analysis["blockchainHash"], Value::Null);
    assert_eq!(analysis["completedAt"], Value::Null);

    tokio::time::sleep(Duration::from_secs(4)).await;

    let (status, body) = send(&app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    let analysis = &body["analysis"];
    assert_eq!(analysis["analysisStatus"], "completed");

    let truth = analysis["truthScore"].as_u64().unwrap();
    assert!((60..=99).contains(&truth));
    let confidence = analysis["aiConfidence"].as_u64().unwrap();
    assert!((80..=99).contains(&confidence));
    assert_eq!(analysis["deepfakeDetected"], json!(truth < 75));
    assert!(is_hash(&analysis["blockchainHash"]));
    assert!(analysis["completedAt"].is_string());

    let results = &analysis["analysisResults"];
    assert_eq!(results["technicalDetails"]["frameRate"], "30fps");
    assert_eq!(results["verificationSources"].as_array().unwrap().len(), 5);
    assert!(results["confidenceBreakdown"]["visualConsistency"].is_i64());
}

#[tokio::test]
async fn test_upload_rejects_non_video() {
    let (state, app) = setup();

    let (status, body) = send(
        &app,
        multipart_request(&[("video", Some(("photo.png", "image/png")), vec![0u8; 64])]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Only video files are allowed");

    assert_eq!(state.store.video_analysis_count().await.unwrap(), 0);
    assert_eq!(state.workflow.pending(), 0);
}

#[tokio::test]
async fn test_upload_without_file() {
    let (state, app) = setup();

    let (status, body) = send(
        &app,
        multipart_request(&[("title", None, b"holiday".to_vec())]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No video file provided");

    // Not multipart at all
    let (status, body) = send(&app, json_request("POST", "/api/video/upload", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No video file provided");

    assert_eq!(state.store.video_analysis_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_rejects_second_file() {
    let (state, app) = setup();

    let (status, body) = send(
        &app,
        multipart_request(&[
            ("video", Some(("a.mp4", "video/mp4")), vec![1u8; 16]),
            ("video", Some(("b.mp4", "video/mp4")), vec![2u8; 16]),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(state.store.video_analysis_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_over_limit() {
    let (state, app) = setup_with(Config {
        max_upload_size: 512,
        ..Config::default()
    });

    let (status, body) = send(
        &app,
        multipart_request(&[("video", Some(("big.mp4", "video/mp4")), vec![0u8; 2048])]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
    assert_eq!(state.store.video_analysis_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_unknown_analysis() {
    let (_state, app) = setup();

    for uri in [
        "/api/video/analysis/42",
        "/api/video/analysis/not-a-number",
        "/api/video/analysis/5abc",
    ] {
        let (status, body) = send(&app, get_request(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Analysis not found");
        assert!(body.get("analysis").is_none());
    }
}

#[tokio::test]
async fn test_list_user_analyses() {
    let (_state, app) = setup();

    let (status, body) = send(&app, get_request("/api/video/analyses?userId=user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["analyses"], json!([]));

    let (status, body) = send(&app, get_request("/api/video/analyses")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// =============================================================================
// Store failures
// =============================================================================

fn assert_generic_error(status: StatusCode, body: &Value, message: &str) {
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, &json!({ "success": false, "message": message }));
    assert!(!body.to_string().to_lowercase().contains("poison"));
}

#[tokio::test]
async fn test_store_failures_answer_generic_500() {
    let (state, app) = setup_broken();

    let (status, body) = send(&app, json_request("POST", "/api/contacts", valid_contact())).await;
    assert_generic_error(
        status,
        &body,
        "An error occurred while sending your message. Please try again.",
    );

    let (status, body) = send(&app, get_request("/api/contacts")).await;
    assert_generic_error(status, &body, "Failed to retrieve contacts");

    let (status, body) = send(
        &app,
        multipart_request(&[("video", Some(("clip.mp4", "video/mp4")), vec![7u8; 1024])]),
    )
    .await;
    assert_generic_error(status, &body, "Failed to process video upload");
    assert_eq!(state.workflow.pending(), 0);

    let (status, body) = send(&app, get_request("/api/video/analysis/1")).await;
    assert_generic_error(status, &body, "Failed to retrieve analysis");

    let (status, body) = send(&app, get_request("/api/video/analyses?userId=user-1")).await;
    assert_generic_error(status, &body, "Failed to retrieve analyses");
}

#[tokio::test]
async fn test_validation_still_reported_with_broken_store() {
    let (_state, app) = setup_broken();

    let (status, body) = send(
        &app,
        multipart_request(&[("video", Some(("photo.png", "image/png")), vec![0u8; 64])]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only video files are allowed");

    let (status, _) = send(&app, json_request("POST", "/api/contacts", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (_state, app) = setup();

    let (status, body) = send(&app, get_request("/_internal/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pendingAnalyses"], 0);
    assert!(body["version"].is_string());
}
