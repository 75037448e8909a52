//! The error code taxonomy: a closed vocabulary of domain-scoped codes.
//!
//! Codes follow the `DOMAIN_ACTION_ERROR` wire shape used by the backend.
//! Unrecognized upstream codes are carried verbatim as [`ErrorCode::Unmapped`]
//! so diagnostic information survives the round trip.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Broad grouping of a code, used to route retry and recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDomain {
    Auth,
    Network,
    Server,
    Validation,
    RateLimit,
    File,
    Catalog,
    Prompt,
    User,
    Generic,
    /// Client-side integrity failures, never retryable.
    Integrity,
}

/// Machine-readable error code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // AUTH
    AuthTokenExpired,
    AuthPermissionDenied,
    AuthSessionInvalid,
    // NETWORK
    NetworkConnectionFailed,
    NetworkOffline,
    NetworkCorsBlocked,
    NetworkRequestTimeout,
    // SERVER
    ServerInternalError,
    ServerUnavailable,
    ServerTimeout,
    // VALIDATION
    ValidationSchemaMismatch,
    ValidationRequiredField,
    // RATE_LIMIT
    RateLimitExceeded,
    // FILE
    FileUploadFailed,
    FileTooLarge,
    // CATALOG
    CatalogLoadFailed,
    CatalogNotFound,
    // PROMPT
    PromptSaveFailed,
    PromptNotFound,
    // USER
    UserPreferencesLoadFailed,
    UserProfileLoadFailed,
    // GENERIC
    RequestFailed,
    RequestAborted,
    UnknownError,
    // Integrity signals: the client itself is misbehaving.
    MethodBindingError,
    ResponseMutationError,
    /// An upstream code we do not recognize, carried verbatim.
    Unmapped(String),
}

impl ErrorCode {
    /// Canonical wire string for this code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AuthTokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::AuthPermissionDenied => "AUTH_PERMISSION_DENIED",
            Self::AuthSessionInvalid => "AUTH_SESSION_INVALID",
            Self::NetworkConnectionFailed => "NETWORK_CONNECTION_FAILED",
            Self::NetworkOffline => "NETWORK_OFFLINE",
            Self::NetworkCorsBlocked => "NETWORK_CORS_BLOCKED",
            Self::NetworkRequestTimeout => "NETWORK_REQUEST_TIMEOUT",
            Self::ServerInternalError => "SERVER_INTERNAL_ERROR",
            Self::ServerUnavailable => "SERVER_UNAVAILABLE",
            Self::ServerTimeout => "SERVER_TIMEOUT",
            Self::ValidationSchemaMismatch => "VALIDATION_SCHEMA_MISMATCH",
            Self::ValidationRequiredField => "VALIDATION_REQUIRED_FIELD",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::FileUploadFailed => "FILE_UPLOAD_FAILED",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::CatalogLoadFailed => "CATALOG_LOAD_FAILED",
            Self::CatalogNotFound => "CATALOG_NOT_FOUND",
            Self::PromptSaveFailed => "PROMPT_SAVE_FAILED",
            Self::PromptNotFound => "PROMPT_NOT_FOUND",
            Self::UserPreferencesLoadFailed => "USER_PREFERENCES_LOAD_FAILED",
            Self::UserProfileLoadFailed => "USER_PROFILE_LOAD_FAILED",
            Self::RequestFailed => "REQUEST_FAILED",
            Self::RequestAborted => "REQUEST_ABORTED",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::MethodBindingError => "METHOD_BINDING_ERROR",
            Self::ResponseMutationError => "RESPONSE_MUTATION_ERROR",
            Self::Unmapped(code) => code,
        }
    }

    /// Parse a wire string; unknown codes become [`ErrorCode::Unmapped`].
    pub fn parse(code: &str) -> Self {
        match code {
            "AUTH_TOKEN_EXPIRED" => Self::AuthTokenExpired,
            "AUTH_PERMISSION_DENIED" => Self::AuthPermissionDenied,
            "AUTH_SESSION_INVALID" => Self::AuthSessionInvalid,
            "NETWORK_CONNECTION_FAILED" => Self::NetworkConnectionFailed,
            "NETWORK_OFFLINE" => Self::NetworkOffline,
            "NETWORK_CORS_BLOCKED" => Self::NetworkCorsBlocked,
            "NETWORK_REQUEST_TIMEOUT" => Self::NetworkRequestTimeout,
            "SERVER_INTERNAL_ERROR" => Self::ServerInternalError,
            "SERVER_UNAVAILABLE" => Self::ServerUnavailable,
            "SERVER_TIMEOUT" => Self::ServerTimeout,
            "VALIDATION_SCHEMA_MISMATCH" => Self::ValidationSchemaMismatch,
            "VALIDATION_REQUIRED_FIELD" => Self::ValidationRequiredField,
            "RATE_LIMIT_EXCEEDED" => Self::RateLimitExceeded,
            "FILE_UPLOAD_FAILED" => Self::FileUploadFailed,
            "FILE_TOO_LARGE" => Self::FileTooLarge,
            "CATALOG_LOAD_FAILED" => Self::CatalogLoadFailed,
            "CATALOG_NOT_FOUND" => Self::CatalogNotFound,
            "PROMPT_SAVE_FAILED" => Self::PromptSaveFailed,
            "PROMPT_NOT_FOUND" => Self::PromptNotFound,
            "USER_PREFERENCES_LOAD_FAILED" => Self::UserPreferencesLoadFailed,
            "USER_PROFILE_LOAD_FAILED" => Self::UserProfileLoadFailed,
            "REQUEST_FAILED" => Self::RequestFailed,
            "REQUEST_ABORTED" => Self::RequestAborted,
            "UNKNOWN_ERROR" => Self::UnknownError,
            "METHOD_BINDING_ERROR" => Self::MethodBindingError,
            "RESPONSE_MUTATION_ERROR" => Self::ResponseMutationError,
            other => Self::Unmapped(other.to_string()),
        }
    }

    /// Whether `parse` would recognize this string as a taxonomy code.
    pub fn is_known(code: &str) -> bool {
        !matches!(Self::parse(code), Self::Unmapped(_))
    }

    /// Classify this code's domain.
    pub fn domain(&self) -> ErrorDomain {
        match self {
            Self::AuthTokenExpired | Self::AuthPermissionDenied | Self::AuthSessionInvalid => {
                ErrorDomain::Auth
            }
            Self::NetworkConnectionFailed
            | Self::NetworkOffline
            | Self::NetworkCorsBlocked
            | Self::NetworkRequestTimeout => ErrorDomain::Network,
            Self::ServerInternalError | Self::ServerUnavailable | Self::ServerTimeout => {
                ErrorDomain::Server
            }
            Self::ValidationSchemaMismatch | Self::ValidationRequiredField => {
                ErrorDomain::Validation
            }
            Self::RateLimitExceeded => ErrorDomain::RateLimit,
            Self::FileUploadFailed | Self::FileTooLarge => ErrorDomain::File,
            Self::CatalogLoadFailed | Self::CatalogNotFound => ErrorDomain::Catalog,
            Self::PromptSaveFailed | Self::PromptNotFound => ErrorDomain::Prompt,
            Self::UserPreferencesLoadFailed | Self::UserProfileLoadFailed => ErrorDomain::User,
            Self::MethodBindingError | Self::ResponseMutationError => ErrorDomain::Integrity,
            Self::RequestFailed | Self::RequestAborted | Self::UnknownError | Self::Unmapped(_) => {
                ErrorDomain::Generic
            }
        }
    }

    /// True exactly for the client-side integrity signals, which are never
    /// retried and always trip a breaker.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::MethodBindingError | Self::ResponseMutationError)
    }

    /// Not-found-shaped codes are never automatically retried.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CatalogNotFound | Self::PromptNotFound)
    }

    /// Default retry policy for this code.
    ///
    /// NETWORK and SERVER domains, rate limiting, and the generic
    /// `REQUEST_FAILED` are retryable; AUTH, VALIDATION, FILE, not-found
    /// codes, and integrity signals are not. `REQUEST_ABORTED` reflects a
    /// caller-initiated cancellation and is excluded.
    pub fn is_retryable(&self) -> bool {
        if self.is_integrity_failure() || self.is_not_found() {
            return false;
        }
        match self {
            Self::RateLimitExceeded | Self::RequestFailed => true,
            _ => matches!(self.domain(), ErrorDomain::Network | ErrorDomain::Server),
        }
    }

    /// Map an HTTP status to a taxonomy code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::ValidationSchemaMismatch,
            401 => Self::AuthTokenExpired,
            403 => Self::AuthPermissionDenied,
            404 => Self::RequestFailed,
            429 => Self::RateLimitExceeded,
            502 | 503 => Self::ServerUnavailable,
            504 => Self::ServerTimeout,
            500..=599 => Self::ServerInternalError,
            _ => Self::RequestFailed,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::parse(&code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_exact() {
        let cases = [
            (400, ErrorCode::ValidationSchemaMismatch),
            (401, ErrorCode::AuthTokenExpired),
            (403, ErrorCode::AuthPermissionDenied),
            (404, ErrorCode::RequestFailed),
            (429, ErrorCode::RateLimitExceeded),
            (500, ErrorCode::ServerInternalError),
            (502, ErrorCode::ServerUnavailable),
            (503, ErrorCode::ServerUnavailable),
            (504, ErrorCode::ServerTimeout),
        ];
        for (status, expected) in cases {
            assert_eq!(ErrorCode::from_status(status), expected, "status {status}");
        }
    }

    #[test]
    fn parse_round_trips_known_codes() {
        for code in [
            ErrorCode::AuthTokenExpired,
            ErrorCode::NetworkOffline,
            ErrorCode::ServerUnavailable,
            ErrorCode::RateLimitExceeded,
            ErrorCode::MethodBindingError,
        ] {
            assert_eq!(ErrorCode::parse(code.as_str()), code);
        }
        assert_eq!(
            ErrorCode::parse("UPSTREAM_SURPRISE"),
            ErrorCode::Unmapped("UPSTREAM_SURPRISE".to_string())
        );
    }

    #[test]
    fn retry_policy_by_domain() {
        assert!(ErrorCode::NetworkConnectionFailed.is_retryable());
        assert!(ErrorCode::ServerInternalError.is_retryable());
        assert!(ErrorCode::RateLimitExceeded.is_retryable());
        assert!(ErrorCode::RequestFailed.is_retryable());

        assert!(!ErrorCode::AuthTokenExpired.is_retryable());
        assert!(!ErrorCode::ValidationSchemaMismatch.is_retryable());
        assert!(!ErrorCode::FileUploadFailed.is_retryable());
        assert!(!ErrorCode::CatalogNotFound.is_retryable());
        assert!(!ErrorCode::RequestAborted.is_retryable());
        assert!(!ErrorCode::MethodBindingError.is_retryable());
        assert!(!ErrorCode::ResponseMutationError.is_retryable());
    }
}
