//! Per-resource circuit breakers.
//!
//! Each breaker is an independent three-state machine (closed, open,
//! half-open) wrapped around an arbitrary async operation. Failure counting
//! is all-or-nothing while closed (one success zeroes the counters) and
//! single-probe while half-open, which avoids flapping under partial
//! recovery while still returning to service quickly once health is
//! confirmed.

pub mod registry;

pub use registry::{BreakerRegistry, RegistryError};

use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::error::{CircuitBreakerError, GuardError};

/// Breaker configuration, immutable per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures while closed before the breaker opens.
    pub failure_threshold: u32,
    /// How long an open breaker rejects calls before allowing a probe.
    pub recovery_timeout: Duration,
    /// Failures older than this window decay out of the count.
    pub monitoring_period: Duration,
    /// Probe successes required to close again from half-open.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            monitoring_period: Duration::from_secs(60),
            success_threshold: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        };
        f.write_str(s)
    }
}

/// Read-only snapshot for observability.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerMetrics {
    pub name: String,
    pub state: BreakerState,
    pub failure_count: u32,
    pub success_count: u32,
    pub config: CircuitBreakerConfig,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
    next_attempt: Option<Instant>,
}

impl BreakerInner {
    fn zeroed() -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure: None,
            next_attempt: None,
        }
    }
}

/// A named, independent failure tracker.
///
/// State is guarded by this breaker's own mutex; the lock is held only
/// across state inspection and update, never across an await point.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner::zeroed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Run an operation through the breaker.
    ///
    /// An open breaker rejects with [`GuardError::Rejected`] without
    /// invoking the operation; the operation's own failures surface as
    /// [`GuardError::Operation`].
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, GuardError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.preflight().map_err(GuardError::Rejected)?;
        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(GuardError::Operation(e))
            }
        }
    }

    /// Gate check: decides whether a call may proceed, transitioning an
    /// elapsed open breaker to half-open.
    pub fn preflight(&self) -> Result<(), CircuitBreakerError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        self.decay_stale_failure(&mut inner, now);
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => Ok(()),
            BreakerState::Open => {
                // Invariant: open implies a scheduled next attempt.
                let next = inner.next_attempt.unwrap_or(now);
                if now >= next {
                    inner.state = BreakerState::HalfOpen;
                    inner.success_count = 0;
                    tracing::debug!(breaker = %self.name, "half-open: allowing probe call");
                    Ok(())
                } else {
                    Err(CircuitBreakerError {
                        name: self.name.clone(),
                        state: BreakerState::Open,
                        retry_after: Some(next - now),
                    })
                }
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            BreakerState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    tracing::info!(breaker = %self.name, "closing after successful probe");
                    *inner = BreakerInner::zeroed();
                }
            }
            BreakerState::Closed => {
                inner.failure_count = 0;
                inner.success_count = 0;
                inner.last_failure = None;
            }
            // A success observed while open (call admitted before the
            // transition) leaves the schedule untouched.
            BreakerState::Open => {}
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        match inner.state {
            BreakerState::HalfOpen => {
                self.open(&mut inner, now, self.config.recovery_timeout);
            }
            BreakerState::Closed => {
                inner.failure_count += 1;
                inner.last_failure = Some(now);
                if inner.failure_count >= self.config.failure_threshold {
                    self.open(&mut inner, now, self.config.recovery_timeout);
                }
            }
            BreakerState::Open => {
                inner.last_failure = Some(now);
            }
        }
    }

    /// Unconditionally open, with an optional caller-specified recovery
    /// delay (defaults to the configured one). Used for correlated failure
    /// classes that must not wait for the threshold.
    pub fn force_open(&self, recovery: Option<Duration>) {
        let mut inner = self.inner.lock().unwrap();
        let delay = recovery.unwrap_or(self.config.recovery_timeout);
        self.open(&mut inner, Instant::now(), delay);
    }

    /// Unconditionally return to the zero closed state.
    pub fn force_reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = BreakerInner::zeroed();
        tracing::debug!(breaker = %self.name, "force reset to closed");
    }

    pub fn current_state(&self) -> BreakerState {
        self.inner.lock().unwrap().state
    }

    pub fn metrics(&self) -> BreakerMetrics {
        let inner = self.inner.lock().unwrap();
        BreakerMetrics {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            config: self.config,
        }
    }

    fn open(&self, inner: &mut BreakerInner, now: Instant, recovery: Duration) {
        inner.state = BreakerState::Open;
        inner.next_attempt = Some(now + recovery);
        inner.last_failure = Some(now);
        tracing::warn!(
            breaker = %self.name,
            recovery_ms = recovery.as_millis() as u64,
            "circuit breaker opened"
        );
    }

    /// Best-effort decay: drop one stale failure when the most recent
    /// failure fell outside the monitoring window, so a closed breaker does
    /// not accumulate counts across unrelated incidents.
    fn decay_stale_failure(&self, inner: &mut BreakerInner, now: Instant) {
        if inner.state != BreakerState::Closed || inner.failure_count == 0 {
            return;
        }
        if let Some(last) = inner.last_failure {
            if now.duration_since(last) > self.config.monitoring_period {
                inner.failure_count -= 1;
                inner.last_failure = Some(now);
            }
        }
    }
}
