//! Event fixtures for tests.
//!
//! # Example
//!
//! ```
//! use hermes_lambda::fixtures;
//! use serde_json::json;
//!
//! let event = fixtures::api_gateway_request("POST", "/users")
//!     .json_body(&json!({ "name": "Ana" }))
//!     .build();
//! assert_eq!(event["headers"]["Content-Type"], "application/json");
//!
//! let batch = fixtures::sqs_event(&[json!({ "id": 1 }), json!({ "id": 2 })]);
//! assert_eq!(batch.records[1].message_id, "id_1");
//! ```

use crate::apigateway::{ApiGatewayProxyRequest, CONTENT_TYPE, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON};
use crate::sqs::{SqsEvent, SqsMessage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Starts a gateway request fixture.
#[must_use]
pub fn api_gateway_request(method: &str, path: &str) -> ApiGatewayRequestBuilder {
    ApiGatewayRequestBuilder {
        request: ApiGatewayProxyRequest {
            http_method: method.to_string(),
            path: path.to_string(),
            ..ApiGatewayProxyRequest::default()
        },
    }
}

/// Builder for gateway request fixtures.
#[derive(Debug, Clone)]
pub struct ApiGatewayRequestBuilder {
    request: ApiGatewayProxyRequest,
}

impl ApiGatewayRequestBuilder {
    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request
            .headers
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a query string parameter.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.request
            .query_string_parameters
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn path_parameter(mut self, name: &str, value: &str) -> Self {
        self.request
            .path_parameters
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Sets a raw body.
    #[must_use]
    pub fn body(mut self, body: &str) -> Self {
        self.request.body = Some(body.to_string());
        self
    }

    /// Sets a JSON body and its content type.
    #[must_use]
    pub fn json_body<T: Serialize>(self, body: &T) -> Self {
        let body = serde_json::to_string(body).unwrap_or_default();
        self.header(CONTENT_TYPE, CONTENT_TYPE_JSON).body(&body)
    }

    /// Sets a form body and its content type.
    #[must_use]
    pub fn form_body(self, fields: &[(&str, &str)]) -> Self {
        let body = serde_urlencoded::to_string(fields).unwrap_or_default();
        self.header(CONTENT_TYPE, CONTENT_TYPE_FORM).body(&body)
    }

    /// Base64-encodes the current body.
    #[must_use]
    pub fn base64_encoded(mut self) -> Self {
        if let Some(body) = self.request.body.take() {
            self.request.body = Some(STANDARD.encode(body));
        }
        self.request.is_base64_encoded = true;
        self
    }

    /// Returns the typed request.
    #[must_use]
    pub fn into_request(self) -> ApiGatewayProxyRequest {
        self.request
    }

    /// Returns the raw JSON event.
    #[must_use]
    pub fn build(self) -> Value {
        serde_json::to_value(self.request).unwrap_or(Value::Null)
    }
}

/// Builds an SQS batch with one message per body.
///
/// Message ids are `id_0`, `id_1`, ...
#[must_use]
pub fn sqs_event(bodies: &[Value]) -> SqsEvent {
    SqsEvent {
        records: bodies
            .iter()
            .enumerate()
            .map(|(i, body)| sqs_message(&format!("id_{i}"), &body.to_string()))
            .collect(),
    }
}

/// Builds one SQS message.
#[must_use]
pub fn sqs_message(message_id: &str, body: &str) -> SqsMessage {
    SqsMessage {
        message_id: message_id.to_string(),
        body: body.to_string(),
        receipt_handle: Some(format!("rh-{message_id}")),
        event_source: Some("aws:sqs".to_string()),
        ..SqsMessage::default()
    }
}
