//! # AppError
//!
//! Centralized error handling for the Quire workspace.
//! Maps gateway and validation failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain and adapter operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Blog, Thread, Profile)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., wrong file type, upload too large)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or rejected credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The backend answered with a non-success status.
    #[error("gateway error ({status}): {message}")]
    Gateway { status: u16, message: String },

    /// The backend answered, but the payload did not have the expected shape.
    #[error("malformed {entity} row: {reason}")]
    Malformed { entity: &'static str, reason: String },

    /// Infrastructure failure (e.g., connection refused, timeout)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand used by row mappers when `serde_json` rejects a row.
    pub fn malformed(entity: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Malformed { entity, reason: err.to_string() }
    }

    /// The text shown to an operator. Gateway errors surface the backend's own
    /// message; everything else uses the display form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Gateway { .. } => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Fallback text when the backend gives us nothing better.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// A specialized Result type for Quire logic.
pub type Result<T> = std::result::Result<T, AppError>;
