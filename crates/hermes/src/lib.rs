//! # Hermes
//!
//! **Schema-driven event middleware for serverless functions**
//!
//! Hermes wraps a business handler so it receives a pre-processed event:
//! every declared field is extracted from the raw platform event, transformed
//! (body decoding, for example) and checked against its declaration before
//! the handler runs. Results and errors are shaped into the platform's
//! response format at a single catch boundary.
//!
//! ## Quick Start
//!
//! ```
//! use hermes::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let config = MiddlewareConfig::<()>::new().validator(
//!     "body",
//!     FieldDescriptor::from_schema(json!({
//!         "type": "object",
//!         "properties": { "name": { "type": "string", "minLength": 1 } },
//!         "required": ["name"]
//!     })),
//! );
//!
//! let endpoint = apigateway::middleware(config, |event, _ctx| async move {
//!     Ok(json!({ "hello": event.get("body").and_then(|b| b.get("name")) }))
//! })
//! .unwrap();
//!
//! let event = fixtures::api_gateway_request("POST", "/hello")
//!     .json_body(&json!({ "name": "Ana" }))
//!     .build();
//! let response = endpoint.invoke(event, None).await.unwrap();
//!
//! assert_eq!(response.status_code, 200);
//! assert_eq!(response.body, r#"{"hello":"Ana"}"#);
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! raw event → Schema Pipeline → Handler → Response Formatter → response
//!                   │              │              │
//!                   └──────────────┴──────────────┴──→ Error Handler ──→ error response
//! ```
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | [`core`] | field descriptors, transformers, validation engine, middleware |
//! | [`lambda`] | API Gateway and SQS adapters, response formatters, fixtures |
//! | [`config`] | layered deployment settings |
//! | [`telemetry`] | logging and counters |

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hermes_core as core;

// Re-export platform adapters
pub use hermes_lambda as lambda;

// Re-export settings
pub use hermes_config as config;

// Re-export logging and counters
pub use hermes_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use hermes::prelude::*;
///
/// let config = MiddlewareConfig::<()>::new()
///     .validator("body", FieldDescriptor::type_contract::<serde_json::Value>());
/// assert_eq!(config.fields().count(), 1);
/// ```
pub mod prelude {
    pub use hermes_core::{
        CombinedEvent, EngineOptions, ErrorShape, EventError, FieldDescriptor, Middleware,
        MiddlewareConfig,
    };

    // Adapters
    pub use hermes_lambda::{apigateway, fixtures, sqs};
    pub use hermes_lambda::{
        ApiGatewayProxyResponse, ResponseOptions, SqsBatchResponse, SqsEvent,
    };

    // Settings
    pub use hermes_config::{ConfigLoader, HermesConfig};

    // Logging
    pub use hermes_telemetry::{init_logging, LogConfig};
}
