//! Classification and sanitization properties.

use parapet::prelude::*;
use parapet::util::sanitize::sanitize_message;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn status_to_code_mapping_is_exact() {
    let cases = [
        (400, "VALIDATION_SCHEMA_MISMATCH"),
        (401, "AUTH_TOKEN_EXPIRED"),
        (403, "AUTH_PERMISSION_DENIED"),
        (404, "REQUEST_FAILED"),
        (429, "RATE_LIMIT_EXCEEDED"),
        (500, "SERVER_INTERNAL_ERROR"),
        (502, "SERVER_UNAVAILABLE"),
        (503, "SERVER_UNAVAILABLE"),
        (504, "SERVER_TIMEOUT"),
    ];
    for (status, expected) in cases {
        let envelope = transform(
            RawFailure::Http { status, body: None },
            ErrorCode::UnknownError,
            None,
        );
        assert_eq!(envelope.code.as_str(), expected, "status {status}");
        assert_eq!(envelope.status, Some(status));
    }
}

#[test]
fn sanitize_never_yields_object_object() {
    let inputs = [
        json!({}),
        json!({"a": {"b": {"c": null}}}),
        json!([{"nested": true}, 3]),
        json!(null),
        json!(""),
        json!({"method": "GET", "url": "/x", "correlationId": "c"}),
    ];
    for input in inputs {
        let out = sanitize_message(&input, "fallback");
        assert_ne!(out, "[object Object]", "input: {input}");
        assert!(!out.is_empty(), "input: {input}");
    }
}

#[test]
fn every_envelope_gets_a_trace_id_and_timestamp() {
    let envelope = transform(
        RawFailure::Text("boom".to_string()),
        ErrorCode::RequestFailed,
        None,
    );
    assert!(!envelope.trace_id.is_empty());
    assert!(envelope.message == "boom");

    let serialized = serde_json::to_value(&envelope).unwrap();
    assert!(serialized["timestamp"].is_string());
    assert!(serialized["traceId"].is_string());
}

#[test]
fn classified_integrity_failure_is_never_retryable() {
    let envelope = transform(
        RawFailure::Exception {
            kind: Some("METHOD_BINDING_ERROR".to_string()),
            message: None,
        },
        ErrorCode::UnknownError,
        None,
    );
    let err = ApiError::from_envelope(envelope);
    assert_eq!(err.code, ErrorCode::MethodBindingError);
    assert!(!Retryable::is_retryable(&err));
}
