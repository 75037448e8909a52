//! Convenient re-exports for embedders.

pub use crate::breaker::{
    BreakerMetrics, BreakerRegistry, BreakerState, CircuitBreaker, CircuitBreakerConfig,
    RegistryError,
};
pub use crate::classify::{transform, NetworkKind, RawFailure};
pub use crate::error::{
    ApiError, CircuitBreakerError, ErrorCode, ErrorDetails, ErrorDomain, ErrorResponse, GuardError,
    Result,
};
pub use crate::interceptor::{ErrorInterceptor, HostHooks, NoopHooks, RequestContext};
pub use crate::messages::{
    contextualize, user_message, MessageContext, RecoveryAction, Severity, UserErrorMessage,
};
pub use crate::retry::{with_retry, RetryConfig, Retryable};
pub use crate::util::trace::TraceId;
