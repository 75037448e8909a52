//! The canonical error envelope every raw failure is normalized into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::sanitize;

use super::codes::ErrorCode;

/// Structured detail attached to an envelope by the backend or classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// Canonical error envelope.
///
/// Built exactly once per failure by the classifier and immutable after
/// that. `message` is always sanitized and never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
            trace_id: trace_id.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Copy suitable for logging: secret-bearing detail values are masked.
    pub fn sanitized_for_log(&self) -> Self {
        let mut copy = self.clone();
        if let Some(details) = copy.details.as_mut() {
            if let Some(context) = details.context.as_mut() {
                sanitize::redact(context);
            }
            let field_is_sensitive = details
                .field
                .as_deref()
                .is_some_and(sanitize::is_sensitive_key);
            if field_is_sensitive {
                if let Some(value) = details.value.as_mut() {
                    *value = "[REDACTED]".to_string();
                }
            }
        }
        copy
    }
}
