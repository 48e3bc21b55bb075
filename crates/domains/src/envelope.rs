//! # Envelope
//!
//! The uniform `{ success, data?, message? }` shape every resource fetcher
//! returns. Callers inspect `success`; nothing is thrown across this boundary.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: None }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self { success: true, data: Some(data), message: Some(message.into()) }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, data: None, message: Some(message.into()) }
    }

    /// Message to show when `success` is false, defaulting to the generic text.
    pub fn failure_message(&self) -> &str {
        self.message.as_deref().unwrap_or(crate::error::GENERIC_FAILURE)
    }

    /// Consumes the envelope, yielding the payload of a successful call.
    pub fn into_data(self) -> Option<T> {
        if self.success { self.data } else { None }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope { success: self.success, data: self.data.map(f), message: self.message }
    }
}

impl<T> From<Result<T, AppError>> for Envelope<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(e) => Envelope::fail(e.user_message()),
        }
    }
}
