//! Mapping taxonomy codes to user-facing messages.
//!
//! The table is static; request-specific context is applied to a copy and
//! never mutates the table.

use serde::Serialize;

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Recommended recovery action for a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    Retry,
    Reauth,
    CheckInput,
    Wait,
    Contact,
    None,
}

/// User-facing rendering of an error code. Derived on demand, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserErrorMessage {
    pub user_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub action: RecoveryAction,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    pub show_details: bool,
}

/// Request-specific context applied by [`contextualize`].
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    /// Field name substituted into `{field}` placeholders.
    pub field: Option<String>,
    /// Backend-supplied suggestion appended to the description.
    pub suggestion: Option<String>,
    /// Timeout substituted into `{timeout}` placeholders, in milliseconds.
    pub timeout_ms: Option<u64>,
}

fn entry(
    user_message: &str,
    description: Option<&str>,
    action: RecoveryAction,
    severity: Severity,
    action_label: Option<&str>,
    show_details: bool,
) -> UserErrorMessage {
    UserErrorMessage {
        user_message: user_message.to_string(),
        description: description.map(str::to_string),
        action,
        severity,
        action_label: action_label.map(str::to_string),
        show_details,
    }
}

/// Look up the user-facing message for a code.
pub fn user_message(code: &ErrorCode) -> UserErrorMessage {
    match code {
        ErrorCode::AuthTokenExpired => entry(
            "Your session has expired.",
            Some("Sign in again to continue."),
            RecoveryAction::Reauth,
            Severity::Warning,
            Some("Sign in"),
            false,
        ),
        ErrorCode::AuthPermissionDenied => entry(
            "You don't have permission to do that.",
            Some("Contact an administrator if you believe this is a mistake."),
            RecoveryAction::Contact,
            Severity::Error,
            None,
            false,
        ),
        ErrorCode::AuthSessionInvalid => entry(
            "Your session is no longer valid.",
            Some("Sign in again to continue."),
            RecoveryAction::Reauth,
            Severity::Warning,
            Some("Sign in"),
            false,
        ),
        ErrorCode::NetworkConnectionFailed => entry(
            "Unable to reach the server.",
            Some("Check your connection and try again."),
            RecoveryAction::Retry,
            Severity::Error,
            Some("Retry"),
            false,
        ),
        ErrorCode::NetworkOffline => entry(
            "You appear to be offline.",
            Some("Reconnect to the network and try again."),
            RecoveryAction::Retry,
            Severity::Warning,
            Some("Retry"),
            false,
        ),
        ErrorCode::NetworkCorsBlocked => entry(
            "The request was blocked.",
            Some("A security policy prevented the request from completing."),
            RecoveryAction::Contact,
            Severity::Error,
            None,
            true,
        ),
        ErrorCode::NetworkRequestTimeout | ErrorCode::ServerTimeout => entry(
            "The request took too long.",
            Some("The server did not respond within {timeout} seconds."),
            RecoveryAction::Retry,
            Severity::Warning,
            Some("Retry"),
            false,
        ),
        ErrorCode::ServerInternalError => entry(
            "Something went wrong on our end.",
            Some("The problem has been recorded. Try again in a moment."),
            RecoveryAction::Retry,
            Severity::Error,
            Some("Retry"),
            true,
        ),
        ErrorCode::ServerUnavailable => entry(
            "The service is temporarily unavailable.",
            Some("Try again in a few minutes."),
            RecoveryAction::Wait,
            Severity::Error,
            None,
            false,
        ),
        ErrorCode::ValidationSchemaMismatch => entry(
            "Some of the provided data is invalid.",
            Some("Review the highlighted fields and try again."),
            RecoveryAction::CheckInput,
            Severity::Warning,
            None,
            true,
        ),
        ErrorCode::ValidationRequiredField => entry(
            "{field} is required.",
            Some("Fill in the missing field and try again."),
            RecoveryAction::CheckInput,
            Severity::Warning,
            None,
            false,
        ),
        ErrorCode::RateLimitExceeded => entry(
            "You're doing that too fast.",
            Some("Wait a moment before trying again."),
            RecoveryAction::Wait,
            Severity::Warning,
            None,
            false,
        ),
        ErrorCode::FileUploadFailed => entry(
            "The file could not be uploaded.",
            Some("Check the file and try again."),
            RecoveryAction::CheckInput,
            Severity::Error,
            Some("Retry"),
            false,
        ),
        ErrorCode::FileTooLarge => entry(
            "The file is too large.",
            Some("Choose a smaller file and try again."),
            RecoveryAction::CheckInput,
            Severity::Warning,
            None,
            false,
        ),
        ErrorCode::CatalogLoadFailed => entry(
            "The catalog could not be loaded.",
            Some("Try again in a moment."),
            RecoveryAction::Retry,
            Severity::Error,
            Some("Retry"),
            false,
        ),
        ErrorCode::CatalogNotFound | ErrorCode::PromptNotFound => entry(
            "That item could not be found.",
            Some("It may have been removed."),
            RecoveryAction::None,
            Severity::Info,
            None,
            false,
        ),
        ErrorCode::PromptSaveFailed => entry(
            "Your changes could not be saved.",
            Some("Try saving again."),
            RecoveryAction::Retry,
            Severity::Error,
            Some("Retry"),
            false,
        ),
        ErrorCode::UserPreferencesLoadFailed | ErrorCode::UserProfileLoadFailed => entry(
            "Your settings could not be loaded.",
            Some("Defaults are in effect until they load."),
            RecoveryAction::Retry,
            Severity::Warning,
            Some("Retry"),
            false,
        ),
        ErrorCode::MethodBindingError | ErrorCode::ResponseMutationError => entry(
            "An internal client error occurred.",
            Some("Reload the application. If the problem persists, contact support."),
            RecoveryAction::Contact,
            Severity::Error,
            None,
            true,
        ),
        ErrorCode::RequestAborted => entry(
            "The request was cancelled.",
            None,
            RecoveryAction::None,
            Severity::Info,
            None,
            false,
        ),
        ErrorCode::RequestFailed
        | ErrorCode::UnknownError
        | ErrorCode::Unmapped(_) => entry(
            "Something went wrong.",
            Some("Try again in a moment."),
            RecoveryAction::Retry,
            Severity::Error,
            Some("Retry"),
            false,
        ),
    }
}

/// Apply request-specific context to a mapped message.
pub fn contextualize(mut message: UserErrorMessage, ctx: &MessageContext) -> UserErrorMessage {
    if let Some(field) = &ctx.field {
        message.user_message = message.user_message.replace("{field}", field);
        if let Some(description) = message.description.take() {
            message.description = Some(description.replace("{field}", field));
        }
    }
    if let Some(timeout_ms) = ctx.timeout_ms {
        let seconds = format!("{:.0}", (timeout_ms as f64 / 1000.0).ceil());
        if let Some(description) = message.description.take() {
            message.description = Some(description.replace("{timeout}", &seconds));
        }
    }
    if let Some(suggestion) = &ctx.suggestion {
        message.description = Some(match message.description.take() {
            Some(description) => format!("{description} {suggestion}"),
            None => suggestion.clone(),
        });
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_is_substituted() {
        let base = user_message(&ErrorCode::ValidationRequiredField);
        let ctx = MessageContext {
            field: Some("Email".to_string()),
            ..MessageContext::default()
        };
        let msg = contextualize(base, &ctx);
        assert_eq!(msg.user_message, "Email is required.");
    }

    #[test]
    fn timeout_is_inserted_into_description() {
        let base = user_message(&ErrorCode::ServerTimeout);
        let ctx = MessageContext {
            timeout_ms: Some(30_000),
            ..MessageContext::default()
        };
        let msg = contextualize(base, &ctx);
        assert_eq!(
            msg.description.as_deref(),
            Some("The server did not respond within 30 seconds.")
        );
    }

    #[test]
    fn suggestion_is_appended_without_mutating_the_table() {
        let ctx = MessageContext {
            suggestion: Some("Use a shorter title.".to_string()),
            ..MessageContext::default()
        };
        let msg = contextualize(user_message(&ErrorCode::PromptSaveFailed), &ctx);
        assert!(msg.description.unwrap().ends_with("Use a shorter title."));

        // A fresh lookup is unchanged.
        let fresh = user_message(&ErrorCode::PromptSaveFailed);
        assert_eq!(fresh.description.as_deref(), Some("Try saving again."));
    }

    #[test]
    fn unmapped_codes_get_the_generic_entry() {
        let msg = user_message(&ErrorCode::Unmapped("WEIRD_CODE".to_string()));
        assert_eq!(msg.user_message, "Something went wrong.");
        assert_eq!(msg.action, RecoveryAction::Retry);
    }
}
