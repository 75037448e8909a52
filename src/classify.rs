//! Classification of raw failures into the canonical envelope.
//!
//! The transport boundary produces a closed [`RawFailure`] union, so the
//! classifier matches on explicit tags instead of probing untyped shapes.
//! Network-layer failures and aborts short-circuit before any HTTP-status
//! logic; they never have a response to classify.

use serde_json::Value;
use thiserror::Error;

use crate::error::{ErrorCode, ErrorDetails, ErrorResponse};
use crate::util::sanitize::{sanitize_error, sanitize_message};
use crate::util::trace::TraceId;

/// Generic message used when nothing better can be extracted.
pub const GENERIC_FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Network-layer failure shapes that carry no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Offline,
    CorsBlocked,
    ConnectionFailed,
}

/// A raw failure as produced at the transport boundary.
#[derive(Debug, Error)]
pub enum RawFailure {
    /// Already-canonical envelope, passed through.
    #[error("{}", .0.message)]
    Envelope(ErrorResponse),
    /// HTTP response the transport considered a failure.
    #[error("http status {status}")]
    Http { status: u16, body: Option<String> },
    /// Connection-level failure; there is no response.
    #[error("network failure")]
    Network(NetworkKind),
    /// The caller aborted the request.
    #[error("request aborted")]
    Aborted,
    /// The request timed out client-side.
    #[error("request timed out")]
    Timeout { elapsed_ms: Option<u64> },
    /// A generic exception with an optional type name and message.
    #[error("{}", .message.as_deref().unwrap_or("exception"))]
    Exception {
        kind: Option<String>,
        message: Option<String>,
    },
    /// A structured value of unknown provenance.
    #[error("structured failure")]
    Structured(Value),
    /// A bare primitive.
    #[error("{0}")]
    Text(String),
    /// Nothing usable at all.
    #[error("unknown failure")]
    Unknown,
}

impl RawFailure {
    /// Capture a failed HTTP response, consuming its body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.ok().filter(|b| !b.is_empty());
        Self::Http { status, body }
    }
}

impl From<reqwest::Error> for RawFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout { elapsed_ms: None };
        }
        if e.is_connect() {
            return Self::Network(NetworkKind::ConnectionFailed);
        }
        if let Some(status) = e.status() {
            return Self::Http {
                status: status.as_u16(),
                body: None,
            };
        }
        Self::Exception {
            kind: None,
            message: Some(sanitize_error(&e, GENERIC_FALLBACK_MESSAGE)),
        }
    }
}

/// Transform a raw failure into a canonical envelope.
///
/// `fallback` is used when the failure carries no classifiable code of its
/// own; `correlation_id` links the envelope to the originating request and
/// is generated when absent.
pub fn transform(
    raw: RawFailure,
    fallback: ErrorCode,
    correlation_id: Option<&TraceId>,
) -> ErrorResponse {
    let trace_id = correlation_id
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| TraceId::generate().as_str().to_string());

    match raw {
        RawFailure::Envelope(mut envelope) => {
            if envelope.trace_id.trim().is_empty() {
                envelope.trace_id = trace_id;
            }
            // The envelope invariant: message is never empty, even when the
            // wire value carried a blank one.
            if envelope.message.trim().is_empty() {
                envelope.message = GENERIC_FALLBACK_MESSAGE.to_string();
            }
            envelope
        }
        RawFailure::Http { status, body } => classify_http(status, body.as_deref(), trace_id),
        RawFailure::Network(kind) => {
            let (code, message) = match kind {
                NetworkKind::Offline => (
                    ErrorCode::NetworkOffline,
                    "You appear to be offline. Check your connection and try again.",
                ),
                NetworkKind::CorsBlocked => (
                    ErrorCode::NetworkCorsBlocked,
                    "The request was blocked by a cross-origin policy.",
                ),
                NetworkKind::ConnectionFailed => (
                    ErrorCode::NetworkConnectionFailed,
                    "Unable to reach the server.",
                ),
            };
            ErrorResponse::new(code, message, trace_id)
        }
        RawFailure::Aborted => {
            ErrorResponse::new(ErrorCode::RequestAborted, "The request was cancelled.", trace_id)
        }
        RawFailure::Timeout { elapsed_ms } => {
            let message = match elapsed_ms {
                Some(ms) => format!("The request timed out after {ms} ms."),
                None => "The request timed out.".to_string(),
            };
            ErrorResponse::new(ErrorCode::NetworkRequestTimeout, message, trace_id)
        }
        RawFailure::Exception { kind, message } => {
            let code = kind
                .as_deref()
                .filter(|k| ErrorCode::is_known(k))
                .map(ErrorCode::parse)
                .unwrap_or(fallback);
            let message = sanitize_message(
                &message.map(Value::String).unwrap_or(Value::Null),
                GENERIC_FALLBACK_MESSAGE,
            );
            ErrorResponse::new(code, message, trace_id)
        }
        RawFailure::Structured(value) => classify_structured(value, fallback, trace_id),
        RawFailure::Text(text) => {
            let message = sanitize_message(&Value::String(text), GENERIC_FALLBACK_MESSAGE);
            ErrorResponse::new(fallback, message, trace_id)
        }
        RawFailure::Unknown => {
            ErrorResponse::new(fallback, GENERIC_FALLBACK_MESSAGE, trace_id)
        }
    }
}

/// Map a failed HTTP response, preferring a server-provided error body.
fn classify_http(status: u16, body: Option<&str>, trace_id: String) -> ErrorResponse {
    let mut code = ErrorCode::from_status(status);
    let mut message = default_status_message(status);
    let mut details: Option<ErrorDetails> = None;

    if let Some(parsed) = body
        .filter(|b| !b.trim().is_empty())
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
    {
        if let Some(server_error) = parsed.get("error") {
            if let Some(c) = server_error.get("code").and_then(Value::as_str) {
                code = ErrorCode::parse(c);
            }
            if let Some(m) = server_error.get("message").and_then(Value::as_str) {
                let trimmed = m.trim();
                if !trimmed.is_empty() {
                    message = trimmed.to_string();
                }
            }
            if let Some(d) = server_error.get("details") {
                // Keep whatever the server sent: values that don't match the
                // detail shape ride along in `context` instead of vanishing.
                details = Some(match serde_json::from_value(d.clone()) {
                    Ok(parsed) => parsed,
                    Err(_) => ErrorDetails {
                        context: Some(d.clone()),
                        ..ErrorDetails::default()
                    },
                });
            }
        }
    }

    let mut envelope = ErrorResponse::new(code, message, trace_id).with_status(status);
    envelope.details = details;
    envelope
}

/// Extract a usable message from a structured value without ever dumping
/// the whole object.
fn classify_structured(value: Value, fallback: ErrorCode, trace_id: String) -> ErrorResponse {
    // An envelope-shaped value is passed through as rule 1 would, but only
    // with a usable message; a blank one drops to the extraction path.
    let has_message = value
        .get("message")
        .and_then(Value::as_str)
        .is_some_and(|m| !m.trim().is_empty());
    if value.get("code").map_or(false, Value::is_string) && has_message {
        if let Ok(envelope) = serde_json::from_value::<ErrorResponse>(value.clone()) {
            return transform(RawFailure::Envelope(envelope), fallback, Some(&TraceId::from_string(trace_id)));
        }
    }

    let message = ["message", "msg", "statusText"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_FALLBACK_MESSAGE.to_string());

    ErrorResponse::new(fallback, message, trace_id)
}

fn default_status_message(status: u16) -> String {
    match status {
        400 => "The request was invalid.".to_string(),
        401 => "Your session has expired. Please sign in again.".to_string(),
        403 => "You don't have permission to perform this action.".to_string(),
        404 => "The requested resource was not found.".to_string(),
        429 => "Too many requests. Please wait a moment and try again.".to_string(),
        500 => "The server encountered an internal error.".to_string(),
        502 | 503 => "The service is temporarily unavailable.".to_string(),
        504 => "The server took too long to respond.".to_string(),
        other => format!("Request failed with status {other}."),
    }
}
