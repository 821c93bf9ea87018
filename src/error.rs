//! Error types for reservectl
//!
//! This module defines the error handling strategy for reservectl. There are two
//! error types: `ReservectlError` (main error enum) and `ConfigError` (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `ReservectlError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling. The conversion
//! happens at the CLI boundary using `anyhow::Error::from` to preserve error chains.
//!
//! ## Failure Classes
//!
//! - `InputShape`: a supplied instance or reservation record is missing a required
//!   field or carries a value of the wrong shape. The whole analysis run fails; there
//!   is no partial report.
//! - `Format`: the pricing document is not wrapped the way we expect, or the repaired
//!   text is not valid JSON.
//! - `Transport` / `Aws` / `CloudProvider`: failures talking to remote services. These
//!   are never translated by the matching core, they propagate to the caller.
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable` to indicate whether an operation should be retried.
//! The `RetryPolicy` in `src/retry.rs` uses this to determine retry behavior.
//! `InputShape`, `Format` and `Config` never become valid on a second attempt.

use thiserror::Error;

/// Main error type for reservectl
#[derive(Error, Debug)]
pub enum ReservectlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input shape error: {record} - {field}: {reason}")]
    InputShape {
        record: String,
        field: String,
        reason: String,
    },

    #[error("Pricing document format error: {0}")]
    Format(String),

    #[error("Cloud provider error: {provider} - {message}")]
    CloudProvider {
        provider: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS SDK error: {0}")]
    Aws(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReservectlError {
    /// Shorthand for a missing required field on an input record.
    pub fn missing_field(record: impl Into<String>, field: impl Into<String>) -> Self {
        ReservectlError::InputShape {
            record: record.into(),
            field: field.into(),
            reason: "required field is missing".to_string(),
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ReservectlError>;

/// Trait for determining if an error is retryable
///
/// Used by `RetryPolicy` implementations to determine whether an error
/// should trigger a retry attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for ReservectlError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReservectlError::Retryable { .. }
                | ReservectlError::CloudProvider { .. }
                | ReservectlError::Transport(_)
                | ReservectlError::Io(_)
        )
    }
}
