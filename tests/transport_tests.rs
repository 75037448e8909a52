//! Boundary tests: reqwest failures into `RawFailure` and the envelope.

use std::time::Duration;

use parapet::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn failed_response_prefers_the_server_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prompts"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {
                "code": "PROMPT_SAVE_FAILED",
                "message": "Prompt could not be persisted",
            }
        })))
        .mount(&server)
        .await;

    let response = reqwest::get(format!("{}/prompts", server.uri()))
        .await
        .unwrap();
    let raw = RawFailure::from_response(response).await;
    let envelope = transform(raw, ErrorCode::UnknownError, None);

    assert_eq!(envelope.code, ErrorCode::PromptSaveFailed);
    assert_eq!(envelope.message, "Prompt could not be persisted");
    assert_eq!(envelope.status, Some(500));
}

#[tokio::test]
async fn plain_status_failure_uses_the_status_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let response = reqwest::get(format!("{}/limited", server.uri()))
        .await
        .unwrap();
    let raw = RawFailure::from_response(response).await;
    let envelope = transform(raw, ErrorCode::UnknownError, None);

    assert_eq!(envelope.code, ErrorCode::RateLimitExceeded);
}

#[tokio::test]
async fn connection_refused_maps_to_a_network_failure() {
    // Grab a port that nothing is listening on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap_err();
    let raw = RawFailure::from(err);
    assert!(matches!(
        raw,
        RawFailure::Network(NetworkKind::ConnectionFailed)
    ));

    let envelope = transform(raw, ErrorCode::UnknownError, None);
    assert_eq!(envelope.code, ErrorCode::NetworkConnectionFailed);
}

#[tokio::test]
async fn client_timeout_maps_to_the_timeout_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let err = client
        .get(format!("{}/slow", server.uri()))
        .send()
        .await
        .unwrap_err();
    let raw = RawFailure::from(err);
    assert!(matches!(raw, RawFailure::Timeout { .. }));

    let envelope = transform(raw, ErrorCode::UnknownError, None);
    assert_eq!(envelope.code, ErrorCode::NetworkRequestTimeout);
}
