//! HTTP error mapping.
//!
//! Converts any error caught at the middleware boundary into an
//! [`ApiGatewayProxyResponse`] carrying the standard envelope:
//!
//! ```json
//! { "error": { "type": "NotFoundException", "message": "Resource not found" } }
//! ```
//!
//! An [`EventError`] passes through verbatim. Anything else becomes a 500
//! with a generic message; the original error is only logged.

use super::response::{CONTENT_TYPE, HEADER_TYPE_JSON};
use super::ApiGatewayProxyResponse;
use hermes_core::EventError;
use indexmap::IndexMap;
use tracing::error;

const FALLBACK_BODY: &str =
    r#"{"error":{"type":"InternalServerException","message":"Internal Server Error"}}"#;

/// Maps errors to gateway responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorMapper {
    expose_internal_errors: bool,
}

impl ErrorMapper {
    /// Creates a mapper that hides unexpected error messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts the original message of unexpected errors in the 500 envelope.
    ///
    /// Development only: messages may contain internal details.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Maps one error.
    pub fn map(&self, error: &anyhow::Error) -> ApiGatewayProxyResponse {
        let event_error = if let Some(event_error) = error.downcast_ref::<EventError>() {
            error!(
                status = event_error.status_code(),
                error_type = %event_error.error_type(),
                message = %event_error.message(),
                "request failed"
            );
            event_error.clone()
        } else {
            error!(error = ?error, "unexpected error");
            hermes_telemetry::record_unexpected_error();
            let internal = EventError::internal();
            if self.expose_internal_errors {
                EventError::new(format!("{error:#}"))
                    .with_status_code(internal.status_code())
                    .with_type(internal.error_type())
            } else {
                internal
            }
        };

        let body = serde_json::to_string(&event_error.to_envelope())
            .unwrap_or_else(|_| FALLBACK_BODY.to_string());

        ApiGatewayProxyResponse {
            status_code: event_error.status_code(),
            headers: IndexMap::from([(CONTENT_TYPE.to_string(), HEADER_TYPE_JSON.to_string())]),
            body,
            ..ApiGatewayProxyResponse::default()
        }
    }

    /// Returns this mapper as a middleware error handler.
    ///
    /// The handler never fails: every error becomes a response.
    pub fn into_handler<C: 'static>(
        self,
    ) -> impl Fn(anyhow::Error, Option<&C>) -> anyhow::Result<ApiGatewayProxyResponse> + Clone + Send + Sync + 'static
    {
        move |error: anyhow::Error, _context: Option<&C>| Ok(self.map(&error))
    }
}

/// Maps an error with the default [`ErrorMapper`].
pub fn map_error(error: &anyhow::Error) -> ApiGatewayProxyResponse {
    ErrorMapper::default().map(error)
}
