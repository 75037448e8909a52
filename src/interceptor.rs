//! Central error interception for API calls.
//!
//! Every failed call flows through here exactly once: classification,
//! never-retry handling for integrity failures, a single auth-refresh
//! attempt per trace id, breaker bookkeeping, sanitized logging, analytics,
//! and allow-listed user notification. No path swallows the error; the
//! caller always receives a typed [`ApiError`].

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::breaker::BreakerRegistry;
use crate::classify::{self, RawFailure};
use crate::error::{ApiError, ErrorCode, ErrorResponse};
use crate::messages::{self, UserErrorMessage};
use crate::util::trace::TraceId;

/// How many trace ids the auth-refresh ledger remembers.
const REFRESH_LEDGER_CAP: usize = 256;

/// Codes that surface a direct user notification. Everything else is left
/// to the caller via the mapped message, keeping notification policy
/// centralized and auditable.
const NOTIFY_CODES: [ErrorCode; 4] = [
    ErrorCode::NetworkConnectionFailed,
    ErrorCode::NetworkOffline,
    ErrorCode::RateLimitExceeded,
    ErrorCode::AuthTokenExpired,
];

/// Callbacks supplied by the host application.
///
/// All methods default to no-ops. Implementations must not panic; panics
/// from the synchronous hooks are caught and logged so side effects never
/// block error propagation.
#[async_trait]
pub trait HostHooks: Send + Sync {
    /// Attempt to refresh the auth token. `Some` means a fresh token is in
    /// place and the caller may retry the original request.
    async fn refresh_auth_token(&self) -> Option<String> {
        None
    }

    /// Report an analytics event.
    fn track_analytics(&self, event: &str, properties: serde_json::Value) {
        let _ = (event, properties);
    }

    /// Surface a message directly to the user.
    fn notify_user(&self, message: &UserErrorMessage) {
        let _ = message;
    }
}

/// Hooks that do nothing; the default for hosts that opt out.
pub struct NoopHooks;

#[async_trait]
impl HostHooks for NoopHooks {}

/// Identity of the request a failure belongs to.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub endpoint: String,
    pub method: String,
    pub trace_id: TraceId,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            trace_id: TraceId::generate(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = trace_id;
        self
    }
}

/// Bounded first-in-first-out record of trace ids that already consumed
/// their one auth-refresh attempt.
#[derive(Debug, Default)]
struct RefreshLedger {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl RefreshLedger {
    /// Record a trace id; returns true the first time it is seen.
    fn try_claim(&mut self, trace_id: &str) -> bool {
        if !self.seen.insert(trace_id.to_string()) {
            return false;
        }
        self.order.push_back(trace_id.to_string());
        while self.order.len() > REFRESH_LEDGER_CAP {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }
}

/// The orchestration point invoked on every failed call.
pub struct ErrorInterceptor {
    registry: Arc<BreakerRegistry>,
    hooks: Arc<dyn HostHooks>,
    refreshed: Mutex<RefreshLedger>,
}

impl ErrorInterceptor {
    pub fn new(registry: Arc<BreakerRegistry>, hooks: Arc<dyn HostHooks>) -> Self {
        Self {
            registry,
            hooks,
            refreshed: Mutex::new(RefreshLedger::default()),
        }
    }

    pub fn registry(&self) -> &Arc<BreakerRegistry> {
        &self.registry
    }

    /// Route an operation through the general breaker and the interception
    /// pipeline.
    ///
    /// A rejected call yields a synthesized `SERVER_UNAVAILABLE` error after
    /// logging and analytics only; an operation failure goes through the
    /// full [`handle_failure`](Self::handle_failure) pipeline; a success
    /// resets the general breaker.
    pub async fn run<T, F, Fut>(&self, ctx: &RequestContext, op: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        let general = self.registry.api_general();
        if let Err(rejection) = general.preflight() {
            let envelope = ErrorResponse::new(
                ErrorCode::ServerUnavailable,
                "The service is temporarily unavailable.",
                ctx.trace_id.as_str(),
            );
            tracing::warn!(
                endpoint = %ctx.endpoint,
                method = %ctx.method,
                breaker = %rejection.name,
                trace_id = %ctx.trace_id,
                "call rejected by open circuit breaker"
            );
            self.emit_analytics(ctx, &envelope);
            return Err(ApiError::from_envelope_with_retryable(envelope, false));
        }

        match op().await {
            Ok(value) => {
                self.handle_success();
                Ok(value)
            }
            Err(raw) => Err(self.handle_failure(ctx, raw).await),
        }
    }

    /// Success through the guarded call path closes the general breaker.
    pub fn handle_success(&self) {
        self.registry.api_general().record_success();
    }

    /// The full failure pipeline. Always returns the typed error; nothing
    /// is swallowed.
    pub async fn handle_failure(&self, ctx: &RequestContext, raw: RawFailure) -> ApiError {
        let envelope = classify::transform(raw, ErrorCode::RequestFailed, Some(&ctx.trace_id));
        let general = self.registry.api_general();

        let retryable = match &envelope.code {
            // A response-object mutation means the transport was misused.
            // Trip the general breaker and never retry.
            ErrorCode::ResponseMutationError => {
                general.force_open(None);
                false
            }
            // A binding failure is a programming-integrity signal, not a
            // transient dependency failure. Open the dedicated fast-trip
            // breaker in addition to the general one.
            ErrorCode::MethodBindingError => {
                self.registry
                    .client_binding()
                    .force_open(Some(Duration::from_secs(5)));
                general.force_open(None);
                false
            }
            ErrorCode::AuthTokenExpired => self.attempt_auth_refresh(&envelope.trace_id).await,
            code => {
                let retryable = code.is_retryable();
                if retryable {
                    general.record_failure();
                }
                retryable
            }
        };

        self.emit_log(ctx, &envelope, retryable);
        self.emit_analytics(ctx, &envelope);
        self.maybe_notify(&envelope.code);

        ApiError::from_envelope_with_retryable(envelope, retryable)
    }

    /// At most one refresh attempt per distinct trace id. A successful
    /// refresh marks the error retryable so the caller re-issues the
    /// request with the fresh token.
    async fn attempt_auth_refresh(&self, trace_id: &str) -> bool {
        let first = self.refreshed.lock().unwrap().try_claim(trace_id);
        if !first {
            return false;
        }
        match self.hooks.refresh_auth_token().await {
            Some(_) => {
                tracing::debug!(trace_id, "auth token refreshed; caller should retry");
                true
            }
            None => {
                tracing::debug!(trace_id, "auth token refresh failed");
                false
            }
        }
    }

    fn emit_log(&self, ctx: &RequestContext, envelope: &ErrorResponse, retryable: bool) {
        let logged = envelope.sanitized_for_log();
        tracing::warn!(
            endpoint = %ctx.endpoint,
            method = %ctx.method,
            code = %logged.code,
            status = logged.status,
            trace_id = %logged.trace_id,
            retryable,
            message = %logged.message,
            "api call failed"
        );
    }

    fn emit_analytics(&self, ctx: &RequestContext, envelope: &ErrorResponse) {
        let properties = json!({
            "endpoint": ctx.endpoint,
            "method": ctx.method,
            "status": envelope.status,
            "code": envelope.code,
            "traceId": envelope.trace_id,
            "timestamp": envelope.timestamp,
        });
        let hooks = &self.hooks;
        if catch_unwind(AssertUnwindSafe(|| {
            hooks.track_analytics("api_error", properties)
        }))
        .is_err()
        {
            tracing::debug!("analytics hook panicked; ignoring");
        }
    }

    fn maybe_notify(&self, code: &ErrorCode) {
        if !NOTIFY_CODES.contains(code) {
            return;
        }
        let message = messages::user_message(code);
        let hooks = &self.hooks;
        if catch_unwind(AssertUnwindSafe(|| hooks.notify_user(&message))).is_err() {
            tracing::debug!("notification hook panicked; ignoring");
        }
    }
}
