//! Tests for the retry orchestrator.

use std::result::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parapet::prelude::*;
use pretty_assertions::assert_eq;

fn server_error() -> ApiError {
    ApiError::from_envelope(
        ErrorResponse::new(ErrorCode::ServerInternalError, "boom", "trace-test").with_status(500),
    )
}

fn validation_error() -> ApiError {
    ApiError::from_envelope(
        ErrorResponse::new(ErrorCode::ValidationSchemaMismatch, "bad input", "trace-test")
            .with_status(400),
    )
}

#[tokio::test(start_paused = true)]
async fn always_failing_500_runs_four_attempts_with_exponential_delays() {
    let attempt_times: Arc<Mutex<Vec<tokio::time::Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let times = attempt_times.clone();

    let result: Result<(), ApiError> = with_retry(RetryConfig::default(), || {
        let times = times.clone();
        async move {
            times.lock().unwrap().push(tokio::time::Instant::now());
            Err(server_error())
        }
    })
    .await;

    assert!(result.is_err());
    let times = attempt_times.lock().unwrap();
    assert_eq!(times.len(), 4, "1 initial attempt + 3 retries");
    assert_eq!(times[1] - times[0], Duration::from_millis(1000));
    assert_eq!(times[2] - times[1], Duration::from_millis(2000));
    assert_eq!(times[3] - times[2], Duration::from_millis(4000));
}

#[tokio::test]
async fn non_retryable_errors_rethrow_immediately() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let result: Result<(), ApiError> = with_retry(RetryConfig::default(), || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(validation_error())
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn integrity_failures_are_never_retried_even_when_flagged_retryable() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let result: Result<(), ApiError> = with_retry(RetryConfig::default(), || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let envelope =
                ErrorResponse::new(ErrorCode::MethodBindingError, "lost context", "trace-test");
            Err(ApiError::from_envelope_with_retryable(envelope, true))
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn recovers_when_a_later_attempt_succeeds() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let result = with_retry(RetryConfig::default(), || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(server_error())
            } else {
                Ok("recovered")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "recovered");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn breaker_rejection_is_not_retried() {
    let registry = BreakerRegistry::new();
    let breaker = registry
        .get_or_create(
            "svc",
            CircuitBreakerConfig {
                failure_threshold: 1,
                recovery_timeout: Duration::from_secs(30),
                monitoring_period: Duration::from_secs(60),
                success_threshold: 1,
            },
        )
        .unwrap();
    breaker.force_open(None);

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let result: Result<(), GuardError<ApiError>> = with_retry(RetryConfig::default(), || {
        let breaker = breaker.clone();
        let counter = counter.clone();
        async move {
            breaker
                .execute(|| async {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(server_error())
                })
                .await
        }
    })
    .await;

    assert!(matches!(result, Err(GuardError::Rejected(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn raw_network_failures_are_not_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let result: Result<(), RawFailure> = with_retry(RetryConfig::default(), || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RawFailure::Network(NetworkKind::ConnectionFailed))
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn raw_http_failures_retry_on_server_statuses() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let result: Result<(), RawFailure> = with_retry(
        RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        },
        || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(RawFailure::Http {
                    status: 503,
                    body: None,
                })
            }
        },
    )
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}
