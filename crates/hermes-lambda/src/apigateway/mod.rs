//! API Gateway (REST/HTTP proxy) adapter.
//!
//! The adapter is the core [`Middleware`] with three defaults:
//!
//! - the `body` field is decoded by [`get_body`] unless the configuration
//!   registers its own `body` transformer
//! - handler results are shaped by [`response_json`] unless another formatter
//!   is given
//! - every error is mapped to an error response by [`ErrorMapper`], so the
//!   caller always receives an [`ApiGatewayProxyResponse`]
//!
//! # Example
//!
//! ```
//! use hermes_core::{FieldDescriptor, MiddlewareConfig};
//! use hermes_lambda::apigateway;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let config = MiddlewareConfig::<()>::new()
//!     .validator("body", FieldDescriptor::from_schema(json!({ "type": "object" })));
//!
//! let endpoint = apigateway::middleware(config, |event, _ctx| async move {
//!     Ok(json!({ "received": event.get("body") }))
//! })
//! .unwrap();
//!
//! let raw = json!({
//!     "httpMethod": "POST",
//!     "headers": { "Content-Type": "application/json" },
//!     "body": "{\"a\":1}"
//! });
//! let response = endpoint.invoke(raw, None).await.unwrap();
//! assert_eq!(response.status_code, 200);
//! assert_eq!(response.body, r#"{"received":{"a":1}}"#);
//! # });
//! ```

mod body;
mod error;
mod response;

pub use body::{content_type, get_body, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON};
pub use error::{map_error, ErrorMapper};
pub use response::{
    response_html, response_json, response_media_file, response_redirect, ResponseOptions,
    CONTENT_TYPE, HEADER_TYPE_HTML, HEADER_TYPE_JSON, HEADER_TYPE_OCTET, HEADER_TYPE_PLAIN,
    LOCATION,
};

use hermes_core::{CombinedEvent, ConfigurationError, Middleware, MiddlewareConfig};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// An API Gateway proxy request.
///
/// The middleware works on the raw JSON event; this type is for building
/// events in tests and for typed access through
/// [`CombinedEvent::deserialize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiGatewayProxyRequest {
    /// HTTP method.
    pub http_method: String,
    /// Request path.
    pub path: String,
    /// Single-value headers.
    pub headers: Option<IndexMap<String, String>>,
    /// Single-value query string parameters.
    pub query_string_parameters: Option<IndexMap<String, String>>,
    /// Path parameters.
    pub path_parameters: Option<IndexMap<String, String>>,
    /// Request context, passed through opaquely.
    pub request_context: Option<Value>,
    /// Raw body.
    pub body: Option<String>,
    /// Whether `body` is base64 encoded.
    pub is_base64_encoded: bool,
}

/// An API Gateway proxy response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Single-value headers.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Multi-value headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<IndexMap<String, Vec<String>>>,
    /// Serialized body.
    #[serde(default)]
    pub body: String,
    /// Whether `body` is base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_base64_encoded: Option<bool>,
    /// `Set-Cookie` values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<String>>,
}

impl ApiGatewayProxyResponse {
    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not JSON or does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Installs the gateway's default transformers underneath `config`'s own.
///
/// Only declared fields receive a default.
#[must_use]
pub fn configure<C: 'static>(config: MiddlewareConfig<C>) -> MiddlewareConfig<C> {
    if config.fields().any(|field| field == "body") {
        config.default_transformer("body", |event: &Value, _context: Option<&C>| get_body(event))
    } else {
        config
    }
}

/// Builds a gateway endpoint returning JSON responses.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if a declared schema does not compile.
pub fn middleware<C, R, H, Fut>(
    config: MiddlewareConfig<C>,
    handler: H,
) -> Result<Middleware<C, R, ApiGatewayProxyResponse>, ConfigurationError>
where
    C: Clone + Send + Sync + 'static,
    R: Serialize + Send + 'static,
    H: Fn(CombinedEvent, Option<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    middleware_with(config, handler, response_json::<R>(ResponseOptions::default()))
}

/// Builds a gateway endpoint with a custom response formatter.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if a declared schema does not compile.
pub fn middleware_with<C, R, H, Fut, F>(
    config: MiddlewareConfig<C>,
    handler: H,
    formatter: F,
) -> Result<Middleware<C, R, ApiGatewayProxyResponse>, ConfigurationError>
where
    C: Clone + Send + Sync + 'static,
    R: Send + 'static,
    H: Fn(CombinedEvent, Option<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    F: Fn(R) -> anyhow::Result<ApiGatewayProxyResponse> + Send + Sync + 'static,
{
    middleware_with_context(config, handler, move |result: R, _context: Option<&C>| {
        formatter(result)
    })
}

/// Builds a gateway endpoint whose formatter also receives the invocation
/// context.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if a declared schema does not compile.
pub fn middleware_with_context<C, R, H, Fut, F>(
    config: MiddlewareConfig<C>,
    handler: H,
    formatter: F,
) -> Result<Middleware<C, R, ApiGatewayProxyResponse>, ConfigurationError>
where
    C: Clone + Send + Sync + 'static,
    R: Send + 'static,
    H: Fn(CombinedEvent, Option<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    F: Fn(R, Option<&C>) -> anyhow::Result<ApiGatewayProxyResponse> + Send + Sync + 'static,
{
    let middleware = Middleware::new(configure(config), handler, formatter)?;
    Ok(middleware.with_error_handler(ErrorMapper::default().into_handler()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{EventError, FieldDescriptor};
    use serde_json::json;

    #[test]
    fn test_request_roundtrip_keeps_camel_case() {
        let request: ApiGatewayProxyRequest = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/users",
            "headers": null,
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(request.http_method, "GET");
        assert!(request.headers.is_none());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["httpMethod"], "GET");
    }

    #[test]
    fn test_response_serialization_skips_absent_fields() {
        let response = ApiGatewayProxyResponse {
            status_code: 204,
            ..Default::default()
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "statusCode": 204, "headers": {}, "body": "" }));
    }

    #[tokio::test]
    async fn test_user_body_transformer_wins() {
        let config = MiddlewareConfig::<()>::new()
            .validator("body", FieldDescriptor::type_contract::<Value>())
            .transformer("body", |_: &Value, _: Option<&()>| Ok(json!("custom")));

        let endpoint = middleware(config, |event, _ctx| async move {
            Ok(event.get("body").cloned())
        })
        .unwrap();

        let response = endpoint.invoke(json!({ "body": "{}" }), None).await.unwrap();
        assert_eq!(response.body, "\"custom\"");
    }

    #[tokio::test]
    async fn test_body_is_raw_unless_declared() {
        let endpoint = middleware(MiddlewareConfig::<()>::new(), |event, _ctx| async move {
            Ok(event.get("body").cloned())
        })
        .unwrap();

        let raw = json!({ "headers": { "content-type": "application/json" }, "body": "{\"a\":1}" });
        let response = endpoint.invoke(raw, None).await.unwrap();
        assert_eq!(response.json::<Value>().unwrap(), json!("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_domain_error_becomes_response() {
        let endpoint = middleware(MiddlewareConfig::<()>::new(), |_event, _ctx| async {
            Err::<Value, _>(anyhow::Error::from(
                EventError::new("Resource not found")
                    .with_status_code(404)
                    .with_type("NotFoundException"),
            ))
        })
        .unwrap();

        let response = endpoint.invoke(json!({}), None).await.unwrap();
        assert_eq!(response.status_code, 404);
        let body: Value = response.json().unwrap();
        assert_eq!(body["error"]["type"], "NotFoundException");
    }

    #[derive(Debug, Clone)]
    struct Tenant {
        id: &'static str,
    }

    #[tokio::test]
    async fn test_formatter_sees_context() {
        let endpoint = middleware_with_context(
            MiddlewareConfig::<Tenant>::new(),
            |_event, _ctx| async { Ok(json!({ "ok": true })) },
            |result: Value, context: Option<&Tenant>| {
                let mut response = ApiGatewayProxyResponse {
                    status_code: 200,
                    body: result.to_string(),
                    ..Default::default()
                };
                if let Some(tenant) = context {
                    response.headers.insert("x-tenant".to_string(), tenant.id.to_string());
                }
                Ok(response)
            },
        )
        .unwrap();

        let response = endpoint
            .invoke(json!({}), Some(Tenant { id: "acme" }))
            .await
            .unwrap();
        assert_eq!(response.headers["x-tenant"], "acme");

        let response = endpoint.invoke(json!({}), None).await.unwrap();
        assert!(!response.headers.contains_key("x-tenant"));
    }

    #[tokio::test]
    async fn test_html_formatter() {
        let endpoint = middleware_with(
            MiddlewareConfig::<()>::new(),
            |_event, _ctx| async { Ok("<h1>Hi</h1>".to_string()) },
            response_html(ResponseOptions::new()),
        )
        .unwrap();

        let response = endpoint.invoke(json!({}), None).await.unwrap();
        assert_eq!(response.body, "<!DOCTYPE html><h1>Hi</h1>");
        assert_eq!(response.headers[CONTENT_TYPE], HEADER_TYPE_HTML);
    }
}
