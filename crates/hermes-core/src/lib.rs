//! # Hermes Core
//!
//! Schema-action validation pipeline for serverless event handlers.
//!
//! An endpoint declares, per named event field, what the field must hold and
//! how to extract it. The declaration is compiled once into a pipeline that
//! every invocation runs before the user handler:
//!
//! ```text
//! raw event → [transformer → validator]* → merge → handler → response
//!                      ↓ fail-fast               ↓
//!                 EventError ──────────────→ error handler
//! ```
//!
//! ## Field Descriptors
//!
//! | Descriptor          | Runtime check | Resolved by |
//! |---------------------|---------------|-------------|
//! | `type_contract::<T>` | none          | handler (`CombinedEvent::field`) |
//! | `from_constructor::<T>` | none       | handler (`CombinedEvent::field`) |
//! | `from_schema(json)` | JSON Schema   | pipeline |
//!
//! ## Example
//!
//! ```
//! use hermes_core::{EventError, FieldDescriptor, Middleware, MiddlewareConfig};
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
//! let greet = Middleware::passthrough(config, |event, _ctx| async move {
//!     let name = event.get("body").and_then(|b| b["name"].as_str()).unwrap_or_default();
//!     Ok(format!("hello {name}"))
//! })
//! .unwrap();
//!
//! let ok = greet.invoke(json!({ "body": { "name": "Ana" } }), None).await.unwrap();
//! assert_eq!(ok, "hello Ana");
//!
//! let err = greet.invoke(json!({ "body": { "name": "" } }), None).await.unwrap_err();
//! assert_eq!(err.downcast_ref::<EventError>().unwrap().status_code(), 400);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod event;
pub mod middleware;
pub mod pipeline;
pub mod transformer;

// Re-export main types at crate root
pub use config::MiddlewareConfig;
pub use descriptor::FieldDescriptor;
pub use engine::{CompiledValidator, EngineOptions, ValidationEngine, Violation};
pub use error::{
    ConfigurationError, ErrorDetail, ErrorEnvelope, ErrorShape, EventError,
};
pub use event::{merge, CombinedEvent};
pub use middleware::{
    default_error_handler, propagate, BoxFuture, ErrorHandlerFn, HandlerFn, Middleware,
    ResponseFn,
};
pub use pipeline::{SchemaAction, SchemaPipeline};
pub use transformer::{property, Transformer, TransformerRegistry};
