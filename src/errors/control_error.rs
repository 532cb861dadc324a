use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlErrorKind {
    InvalidParams,
    Timeout,
    Retryable,
    Internal,
}

/// Error surfaced by the executor and the client pool. `code` identifies the
/// stage that failed so the caller can log and decide on retry; nothing here
/// is fatal to the process.
#[derive(Debug, Clone, Serialize)]
pub struct ControlError {
    pub kind: ControlErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ControlError {
    pub fn new(kind: ControlErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: matches!(kind, ControlErrorKind::Timeout | ControlErrorKind::Retryable),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::Retryable, "RETRYABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::Internal, "INTERNAL", message)
    }

    pub fn empty_token() -> Self {
        Self::new(ControlErrorKind::InvalidParams, "EMPTY_TOKEN", "token is empty")
            .with_hint("Send an Authorization header of the form \"Bearer <token>\".")
    }

    pub fn empty_config() -> Self {
        Self::new(
            ControlErrorKind::InvalidParams,
            "EMPTY_CONFIG",
            "cluster config is empty",
        )
    }

    pub fn malformed_config(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::InvalidParams, "MALFORMED_CONFIG", message)
    }

    pub fn malformed_exp_info(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::InvalidParams, "MALFORMED_EXP_INFO", message)
    }

    pub fn request_build(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::Internal, "REQUEST_BUILD", message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::Retryable, "TRANSPORT", message)
    }

    pub fn response_read(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::Retryable, "RESPONSE_READ", message)
    }

    pub fn client_build(message: impl Into<String>) -> Self {
        Self::new(ControlErrorKind::Internal, "CLIENT_BUILD", message)
    }

    /// Non-200 from a remote call. 429 and server errors are worth retrying,
    /// anything else points at the request itself.
    pub fn status_not_ok(status: u16) -> Self {
        let kind = if status == 429 || status >= 500 {
            ControlErrorKind::Retryable
        } else {
            ControlErrorKind::InvalidParams
        };
        Self::new(kind, "STATUS_NOT_OK", format!("HTTP status is not OK ({})", status))
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ControlError {}

impl From<std::io::Error> for ControlError {
    fn from(err: std::io::Error) -> Self {
        ControlError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_follows_kind() {
        assert!(ControlError::transport("boom").retryable);
        assert!(ControlError::timeout("late").retryable);
        assert!(!ControlError::empty_token().retryable);
    }

    #[test]
    fn status_not_ok_kind_depends_on_status() {
        assert_eq!(ControlError::status_not_ok(503).kind, ControlErrorKind::Retryable);
        assert_eq!(ControlError::status_not_ok(429).kind, ControlErrorKind::Retryable);
        assert_eq!(
            ControlError::status_not_ok(404).kind,
            ControlErrorKind::InvalidParams
        );
    }
}
