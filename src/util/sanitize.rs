//! Turning arbitrary failure payloads into safe, human-readable strings.
//!
//! Raw error values arrive in every shape the upstream can produce: plain
//! strings, numbers, arrays of partial failures, structured bodies, or
//! internal request metadata that leaked into an error position. Everything
//! user- or log-visible goes through here first.

use serde_json::Value;

/// Keys whose values are always redacted, matched as substrings,
/// case-insensitive.
const SENSITIVE_KEYS: [&str; 5] = ["password", "token", "secret", "key", "auth"];

/// Keys that mark a value as request plumbing rather than an error payload.
const METADATA_KEYS: [&str; 4] = ["method", "url", "startTime", "correlationId"];

/// Keys whose presence marks a value as error-shaped.
const ERROR_KEYS: [&str; 3] = ["message", "error", "code"];

/// Convert an arbitrary JSON value into a display-safe message.
///
/// Never returns an empty string and never returns a raw object dump for
/// values that are recognizably not errors.
pub fn sanitize_message(value: &Value, fallback: &str) -> String {
    match value {
        Value::Null => fallback.to_string(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                fallback.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => {
            if items.is_empty() {
                return fallback.to_string();
            }
            let parts: Vec<String> = items
                .iter()
                .map(|item| sanitize_message(item, fallback))
                .collect();
            format!("Multiple errors: {}", parts.join("; "))
        }
        Value::Object(map) => {
            if is_request_metadata(map) {
                return fallback.to_string();
            }
            match serde_json::to_string(value) {
                Ok(text) if !text.is_empty() => text,
                _ => fallback.to_string(),
            }
        }
    }
}

/// Sanitize a std error's display text.
pub fn sanitize_error(err: &(dyn std::error::Error + 'static), fallback: &str) -> String {
    let text = err.to_string();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Recursively replace values under sensitive keys with `"[REDACTED]"`.
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                if is_sensitive_key(k) {
                    *v = Value::String("[REDACTED]".to_string());
                } else {
                    redact(v);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact(item);
            }
        }
        _ => {}
    }
}

pub(crate) fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| lower.contains(s))
}

/// Request-plumbing heuristic: at least two metadata keys and nothing
/// error-shaped.
fn is_request_metadata(map: &serde_json::Map<String, Value>) -> bool {
    let hits = METADATA_KEYS.iter().filter(|k| map.contains_key(**k)).count();
    let error_shaped = ERROR_KEYS.iter().any(|k| map.contains_key(*k));
    hits >= 2 && !error_shaped
}
