//! HttpClassifier against an in-process classification endpoint.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use signspeak_classify::{
    Classifier, ClassifierConfig, ClassifyError, HttpClassifier, SignLabel, UPLOAD_FIELD,
};

/// One multipart part as the endpoint saw it.
#[derive(Debug, Clone)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct Endpoint {
    status: StatusCode,
    body: &'static str,
    received: Arc<Mutex<Vec<ReceivedPart>>>,
}

async fn predict(State(endpoint): State<Endpoint>, mut multipart: Multipart) -> (StatusCode, String) {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let part = ReceivedPart {
            name: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: field.bytes().await.unwrap().to_vec(),
        };
        endpoint.received.lock().unwrap().push(part);
    }
    (endpoint.status, endpoint.body.to_string())
}

/// Start a test endpoint answering every request with `status` and `body`.
async fn spawn_endpoint(status: StatusCode, body: &'static str) -> (String, Endpoint) {
    let endpoint = Endpoint {
        status,
        body,
        received: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/predict", post(predict))
        .with_state(endpoint.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/predict"), endpoint)
}

fn classifier(endpoint: String) -> HttpClassifier {
    HttpClassifier::new(ClassifierConfig {
        endpoint,
        timeout_ms: 5_000,
        ..Default::default()
    })
    .unwrap()
}

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

#[tokio::test]
async fn test_uploads_single_jpeg_file_part() {
    let (url, endpoint) = spawn_endpoint(StatusCode::OK, r#"{"result": "yes"}"#).await;

    let classification = classifier(url).classify(JPEG.to_vec()).await.unwrap();

    assert_eq!(classification.label, SignLabel::Yes);
    assert_eq!(classification.raw.as_deref(), Some("yes"));

    let received = endpoint.received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].name, UPLOAD_FIELD);
    assert_eq!(received[0].file_name.as_deref(), Some("frame.jpg"));
    assert_eq!(received[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(received[0].bytes, JPEG);
}

#[tokio::test]
async fn test_label_matched_case_insensitively() {
    let (url, _) = spawn_endpoint(StatusCode::OK, r#"{"result": "No"}"#).await;

    let classification = classifier(url).classify(JPEG.to_vec()).await.unwrap();

    assert_eq!(classification.label, SignLabel::No);
}

#[tokio::test]
async fn test_other_label_is_uncertain() {
    let (url, _) = spawn_endpoint(StatusCode::OK, r#"{"result": "maybe"}"#).await;

    let classification = classifier(url).classify(JPEG.to_vec()).await.unwrap();

    assert_eq!(classification.label, SignLabel::Uncertain);
    assert_eq!(classification.raw.as_deref(), Some("maybe"));
}

#[tokio::test]
async fn test_missing_result_field_is_uncertain() {
    let (url, _) = spawn_endpoint(StatusCode::OK, r#"{"error": "no hand found"}"#).await;

    let classification = classifier(url).classify(JPEG.to_vec()).await.unwrap();

    assert_eq!(classification.label, SignLabel::Uncertain);
    assert_eq!(classification.raw, None);
}

#[tokio::test]
async fn test_non_json_body_is_parse_error() {
    let (url, _) = spawn_endpoint(StatusCode::OK, "service waking up").await;

    let err = classifier(url).classify(JPEG.to_vec()).await.unwrap_err();

    assert!(matches!(err, ClassifyError::Parse(_)));
}

#[tokio::test]
async fn test_json_error_status_without_result_is_uncertain() {
    let (url, _) = spawn_endpoint(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail": "no hand"}"#).await;

    let classification = classifier(url).classify(JPEG.to_vec()).await.unwrap();

    assert_eq!(classification.label, SignLabel::Uncertain);
    assert_eq!(classification.raw, None);
}

#[tokio::test]
async fn test_json_error_status_with_result_is_used() {
    let (url, _) = spawn_endpoint(StatusCode::INTERNAL_SERVER_ERROR, r#"{"result": "yes"}"#).await;

    let classification = classifier(url).classify(JPEG.to_vec()).await.unwrap();

    assert_eq!(classification.label, SignLabel::Yes);
}

#[tokio::test]
async fn test_non_json_error_status() {
    let (url, _) = spawn_endpoint(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").await;

    let err = classifier(url).classify(JPEG.to_vec()).await.unwrap_err();

    assert!(matches!(err, ClassifyError::Status(502)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = classifier(format!("http://{addr}/predict"))
        .classify(JPEG.to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassifyError::Transport(_)));
}
