use serde::{Deserialize, Serialize};
use tracing::error;

use super::sanitizer::OutputSanitizer;
use crate::rate_limit::Role;

/// Classification of a failed request, keyed to a fixed user-facing
/// vocabulary so raw internals never reach non-privileged callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    InvalidInput,
    TypeMismatch,
    OutOfMemory,
    PermissionDenied,
    Timeout,
    ConnectionFailed,
    Other(String),
}

impl ErrorKind {
    pub fn name(&self) -> &str {
        match self {
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::OutOfMemory => "OutOfMemory",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ConnectionFailed => "ConnectionFailed",
            ErrorKind::Other(name) => name,
        }
    }

    pub(super) fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::FileNotFound => "File not found. Please upload again.",
            ErrorKind::InvalidInput => "Invalid input. Please check your data.",
            ErrorKind::TypeMismatch => "Data type error. Please verify file format.",
            ErrorKind::OutOfMemory => "File too large to process. Maximum size: 50MB.",
            ErrorKind::PermissionDenied => "Permission denied. Contact support.",
            ErrorKind::Timeout => "Request timed out. Please try again.",
            ErrorKind::ConnectionFailed => "Service temporarily unavailable.",
            ErrorKind::Other(_) => "An error occurred. Please try again or contact support.",
        }
    }
}

/// Serializable error payload for API responses.
///
/// The message is role-aware and `error_type` is only populated for
/// privileged callers. The unsanitized detail goes to the server log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorResponse {
    pub fn build(
        kind: &ErrorKind,
        detail: &str,
        role: &Role,
        context: Option<serde_json::Value>,
    ) -> Self {
        let privileged = role.is_admin();

        error!(
            error_type = kind.name(),
            detail,
            context = ?context,
            "request failed"
        );

        let sanitizer = OutputSanitizer::default();
        let message = sanitizer.sanitize_error_message(kind, detail, !privileged, privileged);

        Self {
            success: false,
            error: message,
            error_type: privileged.then(|| kind.name().to_string()),
        }
    }
}
