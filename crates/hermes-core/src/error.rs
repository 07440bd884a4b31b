//! Error types for Hermes.
//!
//! This module provides [`EventError`], the structured domain error that flows
//! through the middleware boundary, and [`ConfigurationError`], raised while a
//! [`MiddlewareConfig`](crate::MiddlewareConfig) is compiled.
//!
//! # Error Envelope Format
//!
//! Every [`EventError`] serializes to the same envelope:
//!
//! ```json
//! {
//!   "error": {
//!     "type": "ValidationError",
//!     "message": "Validation failed at body",
//!     "details": [ ... ]
//!   }
//! }
//! ```

use crate::engine::Violation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Status code used when an [`EventError`] is created without one.
pub const DEFAULT_STATUS_CODE: u16 = 400;

/// Type tag used when an [`EventError`] is created without one.
pub const CLIENT_ERROR_TYPE: &str = "ClientException";

/// Type tag of normalized unexpected errors.
pub const INTERNAL_ERROR_TYPE: &str = "InternalServerException";

/// Message of normalized unexpected errors.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Type tag of schema validation failures.
pub const VALIDATION_ERROR_TYPE: &str = "ValidationError";

/// Field name used for violations reported against the value itself.
pub const ROOT_FIELD: &str = "root";

/// Message used when a violation carries no message of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// A structured domain error.
///
/// Handlers return it (through `anyhow`) to signal a business-rule failure
/// with a chosen status code and type; the validation pipeline returns it
/// when a declared field fails its schema. The middleware boundary recognizes
/// it and passes status, type, message and details through verbatim.
///
/// # Example
///
/// ```
/// use hermes_core::EventError;
///
/// let error = EventError::new("Resource not found")
///     .with_status_code(404)
///     .with_type("NotFoundException");
///
/// assert_eq!(error.status_code(), 404);
/// assert_eq!(error.error_type(), "NotFoundException");
/// assert_eq!(error.to_string(), "Resource not found");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct EventError {
    message: String,
    status_code: u16,
    error_type: String,
    details: Option<Value>,
}

impl EventError {
    /// Creates a client error (status 400, type `ClientException`).
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: DEFAULT_STATUS_CODE,
            error_type: CLIENT_ERROR_TYPE.to_string(),
            details: None,
        }
    }

    /// Creates the normalized replacement for an unexpected error.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(INTERNAL_ERROR_MESSAGE)
            .with_status_code(500)
            .with_type(INTERNAL_ERROR_TYPE)
    }

    /// Creates a validation error for the field at `location`.
    ///
    /// The details are built from `violations` according to `shape`.
    #[must_use]
    pub fn validation(location: &str, violations: &[Violation], shape: ErrorShape) -> Self {
        let details = match shape {
            ErrorShape::Simple => Value::Array(
                violations
                    .iter()
                    .map(|violation| simple_detail(location, violation))
                    .collect(),
            ),
            ErrorShape::Full => {
                serde_json::to_value(violations).unwrap_or_else(|_| Value::Array(Vec::new()))
            }
        };

        Self::new(format!("Validation failed at {location}"))
            .with_type(VALIDATION_ERROR_TYPE)
            .with_details(details)
    }

    /// Sets the status code.
    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Sets the type tag.
    #[must_use]
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = error_type.into();
        self
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Returns the type tag.
    #[must_use]
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    /// Returns the structured details, if any.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Returns `true` if this error came from a failed schema check.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.error_type == VALIDATION_ERROR_TYPE
    }

    /// Converts this error to a serializable envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                error_type: self.error_type.clone(),
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

impl From<&str> for EventError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for EventError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Builds one `{location, field, rule, message}` detail entry.
fn simple_detail(location: &str, violation: &Violation) -> Value {
    let field = violation.instance_path.trim_start_matches('/');
    serde_json::json!({
        "location": location,
        "field": if field.is_empty() { ROOT_FIELD } else { field },
        "rule": violation.keyword,
        "message": violation.message.as_deref().unwrap_or(UNKNOWN_ERROR_MESSAGE),
    })
}

/// Shape of the `details` array carried by validation errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorShape {
    /// One `{location, field, rule, message}` entry per violation.
    #[default]
    Simple,
    /// The raw violation objects, untransformed.
    Full,
}

/// Serializable error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Type tag.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
    /// Structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Errors raised while compiling a middleware configuration.
///
/// These never occur per request: a configuration that compiles once is
/// valid for every invocation.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A declared schema could not be compiled.
    #[error("invalid schema for field '{field}': {message}")]
    InvalidSchema {
        /// The declared field name.
        field: String,
        /// Compiler diagnostic.
        message: String,
    },
}
