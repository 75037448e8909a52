//! Error types for parapet.
//!
//! Retryability and breaker state are first-class fields on the error
//! values themselves, so callers match on data instead of probing
//! dynamically-attached properties.

pub mod codes;
pub mod envelope;

pub use codes::{ErrorCode, ErrorDomain};
pub use envelope::{ErrorDetails, ErrorResponse};

use std::time::Duration;

use thiserror::Error;

use crate::breaker::BreakerState;

/// The typed error every failed call ultimately yields.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub status: Option<u16>,
    pub details: Option<ErrorDetails>,
    pub trace_id: String,
    /// Whether a generic retry loop may attempt this call again.
    pub retryable: bool,
}

impl ApiError {
    /// Build from a canonical envelope, deriving retryability from the
    /// taxonomy unless the caller overrides it.
    pub fn from_envelope(envelope: ErrorResponse) -> Self {
        let retryable = envelope.code.is_retryable();
        Self::from_envelope_with_retryable(envelope, retryable)
    }

    pub fn from_envelope_with_retryable(envelope: ErrorResponse, retryable: bool) -> Self {
        Self {
            code: envelope.code,
            message: envelope.message,
            status: envelope.status,
            details: envelope.details,
            trace_id: envelope.trace_id,
            retryable,
        }
    }
}

/// Rejection by an open circuit breaker, carrying its current state.
#[derive(Debug, Clone, Error)]
#[error("circuit breaker '{name}' is {state}; call rejected")]
pub struct CircuitBreakerError {
    pub name: String,
    pub state: BreakerState,
    /// Time until the breaker will next allow a probe, when known.
    pub retry_after: Option<Duration>,
}

/// Outcome of a call routed through a circuit breaker: either the breaker
/// refused to attempt it, or the operation itself failed.
#[derive(Debug, Error)]
pub enum GuardError<E> {
    #[error(transparent)]
    Rejected(CircuitBreakerError),
    #[error(transparent)]
    Operation(E),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ApiError>;
