//! Error types for the privacy radar
//!
//! Nothing in this crate is allowed to take the page down. Every variant here
//! is either recovered locally (logged and replaced by a safe default) or
//! pushes the monitor into fallback mode. The taxonomy provides:
//! - Error codes for programmatic handling
//! - Classification (recoverable in place vs. fallback-triggering)
//! - User-friendly messages

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, RadarError>;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Capability errors (1xx)
    Unsupported = 100,
    QueryFailed = 101,
    QueryTimeout = 102,

    // Interception errors (2xx)
    InterceptFailed = 200,
    UnknownCapability = 201,

    // Input errors (3xx)
    InvalidUrl = 300,
    InvalidEvent = 301,

    // Initialization errors (4xx) - trigger fallback mode
    EntropyError = 400,
    ConfigError = 401,

    // Storage errors (5xx)
    StorageError = 500,

    // Internal errors (9xx)
    InternalError = 900,
}

/// Main error type for the privacy radar
#[derive(Error, Debug, Clone)]
pub enum RadarError {
    // ===== Capability Errors =====
    #[error("Capability not supported: {0}")]
    Unsupported(String),

    #[error("Permission query failed for {name}: {reason}")]
    QueryFailed { name: String, reason: String },

    #[error("Permission query timed out: {0}")]
    QueryTimeout(String),

    // ===== Interception Errors =====
    #[error("Failed to intercept {api}: {reason}")]
    InterceptFailed { api: String, reason: String },

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    // ===== Input Errors =====
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    // ===== Initialization Errors =====
    #[error("Entropy/RNG failure: {0}")]
    EntropyError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ===== Storage Errors =====
    #[error("Storage error: {0}")]
    Storage(String),

    // ===== Internal Errors =====
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RadarError {
    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            RadarError::Unsupported(_) => ErrorCode::Unsupported,
            RadarError::QueryFailed { .. } => ErrorCode::QueryFailed,
            RadarError::QueryTimeout(_) => ErrorCode::QueryTimeout,

            RadarError::InterceptFailed { .. } => ErrorCode::InterceptFailed,
            RadarError::UnknownCapability(_) => ErrorCode::UnknownCapability,

            RadarError::InvalidUrl(_) => ErrorCode::InvalidUrl,
            RadarError::InvalidEvent(_) => ErrorCode::InvalidEvent,

            RadarError::EntropyError(_) => ErrorCode::EntropyError,
            RadarError::Config(_) => ErrorCode::ConfigError,

            RadarError::Storage(_) => ErrorCode::StorageError,

            RadarError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the monitor must drop into fallback mode after this error.
    ///
    /// Only engine construction failures qualify. Everything else is handled
    /// where it happens by substituting a safe default.
    pub fn requires_fallback(&self) -> bool {
        matches!(self, RadarError::EntropyError(_) | RadarError::Config(_))
    }

    /// Whether the caller can carry on with a default value in place of the
    /// failed result.
    pub fn is_recoverable(&self) -> bool {
        !self.requires_fallback()
    }

    /// Get a user-friendly message for display
    pub fn user_message(&self) -> String {
        match self {
            RadarError::Unsupported(_) => {
                "This browser does not support one of the monitored APIs.".into()
            }
            RadarError::QueryFailed { .. } | RadarError::QueryTimeout(_) => {
                "A permission could not be checked and is treated as not granted.".into()
            }
            RadarError::InterceptFailed { .. } => {
                "A protection could not be installed in this browser.".into()
            }
            RadarError::UnknownCapability(name) => format!("Unknown protection: {}", name),
            RadarError::InvalidUrl(_) => "A request URL could not be parsed.".into(),
            RadarError::InvalidEvent(_) => "An invalid threat event was ignored.".into(),
            RadarError::EntropyError(_) => {
                "Random number generation is unavailable. Scores are shown as defaults.".into()
            }
            RadarError::Config(_) => {
                "The monitor configuration is invalid. Scores are shown as defaults.".into()
            }
            RadarError::Storage(_) => {
                "Preferences could not be saved. Please check browser storage permissions.".into()
            }
            RadarError::Internal(_) => "An internal error occurred. Please report this bug.".into(),
        }
    }
}

impl From<RadarError> for JsValue {
    fn from(err: RadarError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<serde_json::Error> for RadarError {
    fn from(err: serde_json::Error) -> Self {
        RadarError::Internal(format!("serialization: {}", err))
    }
}

/// Error information for JavaScript consumption
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u32,
    pub message: String,
    pub user_message: String,
    pub requires_fallback: bool,
}

impl From<&RadarError> for ErrorInfo {
    fn from(err: &RadarError) -> Self {
        ErrorInfo {
            code: err.code() as u32,
            message: err.to_string(),
            user_message: err.user_message(),
            requires_fallback: err.requires_fallback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_errors() {
        assert!(RadarError::EntropyError("test".into()).requires_fallback());
        assert!(RadarError::Config("test".into()).requires_fallback());

        assert!(!RadarError::Unsupported("battery".into()).requires_fallback());
        assert!(!RadarError::InvalidUrl("::".into()).requires_fallback());
        assert!(RadarError::QueryTimeout("camera".into()).is_recoverable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RadarError::QueryFailed {
                name: "camera".into(),
                reason: "TypeError".into()
            }
            .code(),
            ErrorCode::QueryFailed
        );
        assert_eq!(RadarError::Config("x".into()).code(), ErrorCode::ConfigError);
        assert_eq!(ErrorCode::EntropyError as u32, 400);
    }

    #[test]
    fn test_error_info() {
        let err = RadarError::UnknownCapability("teleport".into());
        let info = ErrorInfo::from(&err);
        assert_eq!(info.code, 201);
        assert!(info.user_message.contains("teleport"));
        assert!(!info.requires_fallback);
    }
}
