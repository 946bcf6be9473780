//! Integration tests against an in-process stego service
//!
//! A small axum server stands in for the real encode/decode service so the
//! real reqwest multipart client, response classification and session
//! transitions are exercised together.
//!
//! Tests cover:
//! - Encode success, service errors and unparsable error bodies
//! - Decode success, integrity reporting, service errors and malformed bodies
//! - Unreachable service
//! - Validation never reaching the network
//! - Non-blocking dispatch against the real client

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;

use stego_core::{
    HttpBackend, ImageFile, Mode, Orchestrator, OrchestratorConfig, Outcome, Presentation,
    ServiceConfig, StegoBackend,
};

// =============================================================================
// Mock Service
// =============================================================================

/// Canned reply for one request
#[derive(Clone, Debug)]
enum MockReply {
    /// Binary body with a content type and optional download name
    Binary {
        status: StatusCode,
        body: Vec<u8>,
        file_name: Option<&'static str>,
    },
    /// JSON body
    Json(StatusCode, serde_json::Value),
    /// Plain text body
    Text(StatusCode, &'static str),
}

impl IntoResponse for MockReply {
    fn into_response(self) -> Response {
        match self {
            Self::Binary {
                status,
                body,
                file_name,
            } => {
                let mut response =
                    (status, [(header::CONTENT_TYPE, "image/png")], body).into_response();
                let disposition = file_name
                    .map(|name| format!("attachment; filename=\"{name}\""))
                    .and_then(|value| value.parse::<header::HeaderValue>().ok());
                if let Some(value) = disposition {
                    response
                        .headers_mut()
                        .insert(header::CONTENT_DISPOSITION, value);
                }
                response
            }
            Self::Json(status, value) => (status, Json(value)).into_response(),
            Self::Text(status, text) => (status, text).into_response(),
        }
    }
}

/// One multipart part as received by the mock
#[derive(Clone, Debug)]
struct ReceivedPart {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// Scripted service that records what it receives
#[derive(Default)]
struct MockService {
    encode_replies: Mutex<VecDeque<MockReply>>,
    decode_replies: Mutex<VecDeque<MockReply>>,
    requests: AtomicUsize,
    received: Mutex<Vec<(String, HashMap<String, ReceivedPart>)>>,
}

impl MockService {
    fn on_encode(self, reply: MockReply) -> Self {
        self.encode_replies.lock().push_back(reply);
        self
    }

    fn on_decode(self, reply: MockReply) -> Self {
        self.decode_replies.lock().push_back(reply);
        self
    }

    fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> (String, HashMap<String, ReceivedPart>) {
        self.received.lock().last().cloned().expect("no request received")
    }

    async fn record(&self, route: &str, mut multipart: Multipart) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut parts = HashMap::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            parts.insert(
                name,
                ReceivedPart {
                    file_name,
                    content_type,
                    data,
                },
            );
        }
        self.received.lock().push((route.to_string(), parts));
    }
}

fn unscripted() -> MockReply {
    MockReply::Text(StatusCode::INTERNAL_SERVER_ERROR, "unscripted")
}

async fn encode_route(State(mock): State<Arc<MockService>>, multipart: Multipart) -> MockReply {
    mock.record("/encode", multipart).await;
    let reply = mock.encode_replies.lock().pop_front();
    reply.unwrap_or_else(unscripted)
}

async fn decode_route(State(mock): State<Arc<MockService>>, multipart: Multipart) -> MockReply {
    mock.record("/decode", multipart).await;
    let reply = mock.decode_replies.lock().pop_front();
    reply.unwrap_or_else(unscripted)
}

/// Serve `mock` on an ephemeral port and return its base URL
async fn spawn_service(mock: Arc<MockService>) -> String {
    let app = Router::new()
        .route("/encode", post(encode_route))
        .route("/decode", post(decode_route))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL where nothing is listening
async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// =============================================================================
// Helpers
// =============================================================================

fn orchestrator_for(base_url: &str) -> Orchestrator<HttpBackend> {
    let mut service = ServiceConfig::with_base_url(base_url);
    service.timeout = Duration::from_secs(5);
    service.connect_timeout = Duration::from_secs(2);
    let backend = HttpBackend::new(service).unwrap();
    let (tx, _rx) = mpsc::channel(256);
    Orchestrator::new(backend, OrchestratorConfig::default(), tx)
}

fn carrier() -> ImageFile {
    ImageFile::from_bytes("carrier.png", vec![0x89u8, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap()
}

async fn fill_encode(orchestrator: &mut Orchestrator<HttpBackend>) {
    orchestrator.set_mode(Mode::Encode).await;
    orchestrator.set_image(Some(carrier())).await;
    orchestrator.set_message("  meet at noon  ").await;
    orchestrator.set_key(" hunter2 ").await;
}

async fn fill_decode(orchestrator: &mut Orchestrator<HttpBackend>) {
    orchestrator.set_mode(Mode::Decode).await;
    orchestrator.set_image(Some(carrier())).await;
    orchestrator.set_key("hunter2").await;
}

// =============================================================================
// Encode
// =============================================================================

#[tokio::test]
async fn test_encode_success_wraps_body_in_resource() {
    let body = vec![0x89u8, b'P', b'N', b'G', 42, 42, 42];
    let mock = Arc::new(MockService::default().on_encode(MockReply::Binary {
        status: StatusCode::OK,
        body: body.clone(),
        file_name: None,
    }));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_encode(&mut orchestrator).await;

    let handle = orchestrator
        .submit_encode()
        .await
        .encoded_handle()
        .cloned()
        .expect("encoded outcome");

    assert_eq!(
        orchestrator.resources().bytes(&handle).unwrap().to_vec(),
        body
    );
    assert_eq!(handle.content_type, "image/png");
    assert_eq!(handle.file_name, "encoded_image.png");
    assert_eq!(mock.request_count(), 1);

    let (route, parts) = mock.last_request();
    assert_eq!(route, "/encode");
    assert_eq!(parts["message"].data, b"meet at noon".to_vec());
    assert_eq!(parts["key"].data, b"hunter2".to_vec());
    assert_eq!(parts["image"].data, carrier().bytes().to_vec());
    assert_eq!(parts["image"].file_name.as_deref(), Some("carrier.png"));
    assert_eq!(parts["image"].content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_encode_uses_suggested_download_name() {
    let mock = Arc::new(MockService::default().on_encode(MockReply::Binary {
        status: StatusCode::OK,
        body: vec![1, 2, 3],
        file_name: Some("../../stego_result.png"),
    }));
    let url = spawn_service(mock).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_encode(&mut orchestrator).await;

    let handle = orchestrator.submit_encode().await.encoded_handle().cloned().unwrap();
    assert_eq!(handle.file_name, "stego_result.png");
}

#[tokio::test]
async fn test_encode_service_error_is_shown_verbatim() {
    let mock = Arc::new(
        MockService::default()
            .on_encode(MockReply::Json(StatusCode::BAD_REQUEST, json!({"error": "bad key"}))),
    );
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_encode(&mut orchestrator).await;

    assert_eq!(
        orchestrator.submit_encode().await,
        &Outcome::Error("bad key".to_string())
    );
    assert_eq!(mock.request_count(), 1);
    assert_eq!(
        orchestrator.presentation(),
        Presentation::ErrorBanner("bad key".to_string())
    );
}

#[tokio::test]
async fn test_encode_error_without_structured_body_falls_back() {
    let mock = Arc::new(
        MockService::default()
            .on_encode(MockReply::Text(StatusCode::BAD_GATEWAY, "<html>upstream</html>"))
            .on_encode(MockReply::Json(StatusCode::BAD_REQUEST, json!({"detail": "x"}))),
    );
    let url = spawn_service(mock).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_encode(&mut orchestrator).await;

    assert_eq!(
        orchestrator.submit_encode().await.error_message(),
        Some("Encoding failed.")
    );
    assert_eq!(
        orchestrator.submit_encode().await.error_message(),
        Some("Encoding failed.")
    );
}

// =============================================================================
// Decode
// =============================================================================

#[tokio::test]
async fn test_decode_success_recovers_message() {
    let mock = Arc::new(
        MockService::default().on_decode(MockReply::Json(StatusCode::OK, json!({"message": "hello"}))),
    );
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_decode(&mut orchestrator).await;

    assert_eq!(orchestrator.submit_decode().await.decoded_text(), Some("hello"));

    let (route, parts) = mock.last_request();
    assert_eq!(route, "/decode");
    assert_eq!(parts["key"].data, b"hunter2".to_vec());
    assert!(parts.contains_key("image"));
    assert!(!parts.contains_key("message"));
}

#[tokio::test]
async fn test_decode_reports_integrity() {
    let mock = Arc::new(MockService::default().on_decode(MockReply::Json(
        StatusCode::OK,
        json!({"message": "hello", "integrity": "verified"}),
    )));
    let url = spawn_service(mock).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_decode(&mut orchestrator).await;

    orchestrator.submit_decode().await;
    match orchestrator.presentation() {
        Presentation::RecoveredText(recovered) => {
            assert_eq!(recovered.text, "hello");
            assert!(recovered.is_verified());
        }
        other => panic!("unexpected presentation: {other:?}"),
    }
}

#[tokio::test]
async fn test_decode_service_errors() {
    let mock = Arc::new(
        MockService::default()
            .on_decode(MockReply::Json(
                StatusCode::BAD_REQUEST,
                json!({"error": "Invalid key or corrupted image"}),
            ))
            .on_decode(MockReply::Json(StatusCode::INTERNAL_SERVER_ERROR, json!({})))
            .on_decode(MockReply::Text(StatusCode::SERVICE_UNAVAILABLE, "down")),
    );
    let url = spawn_service(mock).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_decode(&mut orchestrator).await;

    assert_eq!(
        orchestrator.submit_decode().await.error_message(),
        Some("Invalid key or corrupted image")
    );
    assert_eq!(
        orchestrator.submit_decode().await.error_message(),
        Some("Decoding failed.")
    );
    // An unparsable error body counts as a network/server failure.
    assert_eq!(
        orchestrator.submit_decode().await.error_message(),
        Some("Decoding failed due to a network or server error.")
    );
}

#[tokio::test]
async fn test_decode_html_gateway_error_is_transport_failure() {
    let mock = Arc::new(
        MockService::default().on_decode(MockReply::Text(StatusCode::BAD_GATEWAY, "<html>502</html>")),
    );
    let url = spawn_service(mock).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_decode(&mut orchestrator).await;

    assert_eq!(
        orchestrator.submit_decode().await,
        &Outcome::Error("Decoding failed due to a network or server error.".to_string())
    );
}

#[tokio::test]
async fn test_malformed_decode_success_replaces_previous_result() {
    let mock = Arc::new(
        MockService::default()
            .on_decode(MockReply::Json(StatusCode::OK, json!({"message": "hello"})))
            .on_decode(MockReply::Text(StatusCode::OK, "not json"))
            .on_decode(MockReply::Json(StatusCode::OK, json!({"integrity": "verified"}))),
    );
    let url = spawn_service(mock).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_decode(&mut orchestrator).await;

    assert_eq!(orchestrator.submit_decode().await.decoded_text(), Some("hello"));
    assert_eq!(
        orchestrator.submit_decode().await,
        &Outcome::Error("Decoding failed due to a network or server error.".to_string())
    );
    assert_eq!(
        orchestrator.submit_decode().await,
        &Outcome::Error("Decoding failed due to a network or server error.".to_string())
    );
}

#[tokio::test]
async fn test_unreachable_decode_service() {
    let url = unreachable_url().await;
    let mut orchestrator = orchestrator_for(&url);
    fill_decode(&mut orchestrator).await;

    assert_eq!(
        orchestrator.submit_decode().await,
        &Outcome::Error("Decoding failed due to a network or server error.".to_string())
    );
    assert!(!orchestrator.state().is_busy());
    assert_eq!(orchestrator.resources().live_count(), 0);
    assert!(!orchestrator.backend().health_check().await);
}

#[tokio::test]
async fn test_unreachable_encode_service() {
    let url = unreachable_url().await;
    let mut orchestrator = orchestrator_for(&url);
    fill_encode(&mut orchestrator).await;

    assert_eq!(
        orchestrator.submit_encode().await,
        &Outcome::Error("Encoding failed due to a network or server error.".to_string())
    );
}

// =============================================================================
// Validation and dispatch
// =============================================================================

#[tokio::test]
async fn test_validation_failures_never_reach_the_service() {
    let mock = Arc::new(MockService::default());
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut orchestrator = orchestrator_for(&url);

    orchestrator.set_mode(Mode::Encode).await;
    orchestrator.set_image(Some(carrier())).await;
    orchestrator.set_key("k").await;
    assert_eq!(
        orchestrator.submit_encode().await.error_message(),
        Some("Please provide an image, a secret message, and an encryption key.")
    );

    orchestrator.set_mode(Mode::Decode).await;
    orchestrator.set_key("   ").await;
    assert_eq!(
        orchestrator.submit_decode().await.error_message(),
        Some("Please provide an image and the decryption key used during encoding.")
    );

    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_dispatch_against_service() {
    let mock = Arc::new(
        MockService::default().on_decode(MockReply::Json(StatusCode::OK, json!({"message": "async"}))),
    );
    let url = spawn_service(mock).await;
    let mut orchestrator = orchestrator_for(&url);
    fill_decode(&mut orchestrator).await;

    assert!(orchestrator.dispatch().await.is_some());
    assert!(orchestrator.state().is_busy());

    for _ in 0..400 {
        orchestrator.poll_completions().await;
        if !orchestrator.state().is_busy() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(orchestrator.outcome().decoded_text(), Some("async"));
}

#[tokio::test]
async fn test_health_check_counts_any_response() {
    let url = spawn_service(Arc::new(MockService::default())).await;
    let orchestrator = orchestrator_for(&url);
    assert!(orchestrator.backend().health_check().await);
}
