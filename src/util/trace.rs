//! Opaque per-request correlation ids.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier linking a request to its eventual error.
///
/// Generated once per request and carried through classification, logging,
/// and analytics. Callers must not inspect its structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(format!("trace-{}", Uuid::new_v4().simple()))
    }

    /// Wrap an id received from elsewhere (an upstream envelope, a test).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
