//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::classify::RawFailure;
use crate::error::{ApiError, GuardError};

/// Retry policy configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(8000),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Backoff delay before retrying attempt `attempt` (1-indexed):
    /// `min(max_delay, base_delay × backoff_factor^(attempt − 1))`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let delay = self.base_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Retryability policy, evaluated by [`with_retry`] before sleeping.
///
/// Integrity failures are non-retryable regardless of any other rule; a
/// classified [`ApiError`]'s own flag governs it; raw network, CORS, and
/// timeout shapes are non-retryable (retrying a failed network layer risks
/// amplifying an outage); raw HTTP failures retry on 5xx and 429.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        if self.code.is_integrity_failure() {
            return false;
        }
        self.retryable
    }
}

impl Retryable for RawFailure {
    fn is_retryable(&self) -> bool {
        match self {
            RawFailure::Envelope(envelope) => {
                !envelope.code.is_integrity_failure() && envelope.code.is_retryable()
            }
            RawFailure::Network(_) | RawFailure::Timeout { .. } | RawFailure::Aborted => false,
            RawFailure::Http { status, .. } => *status >= 500 || *status == 429,
            RawFailure::Exception { .. }
            | RawFailure::Structured(_)
            | RawFailure::Text(_)
            | RawFailure::Unknown => false,
        }
    }
}

impl<E: Retryable> Retryable for GuardError<E> {
    fn is_retryable(&self) -> bool {
        match self {
            // The breaker owns re-probe scheduling; retrying into an open
            // breaker only burns attempts.
            Self::Rejected(_) => false,
            Self::Operation(e) => e.is_retryable(),
        }
    }
}

/// Drive an operation through a bounded retry loop.
///
/// Attempts run `1..=max_retries + 1`; a non-retryable error or an
/// exhausted budget rethrows immediately.
pub async fn with_retry<T, E, F, Fut>(config: RetryConfig, mut op: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_retries + 1;
    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_attempts || !e.is_retryable() {
                    return Err(e);
                }
                let delay = config.delay_for_attempt(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying after error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    unreachable!("retry loop returns from within")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_is_capped_exponential() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(8000));
        // Capped at max_delay from here on.
        assert_eq!(config.delay_for_attempt(10), Duration::from_millis(8000));
    }

    #[test]
    fn raw_failure_policy() {
        assert!(!RawFailure::Timeout { elapsed_ms: None }.is_retryable());
        assert!(!RawFailure::Network(crate::classify::NetworkKind::CorsBlocked).is_retryable());
        assert!(RawFailure::Http {
            status: 500,
            body: None
        }
        .is_retryable());
        assert!(RawFailure::Http {
            status: 429,
            body: None
        }
        .is_retryable());
        assert!(!RawFailure::Http {
            status: 404,
            body: None
        }
        .is_retryable());
    }
}
