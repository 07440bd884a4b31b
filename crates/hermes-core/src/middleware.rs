//! The middleware factory.
//!
//! A [`Middleware`] binds a compiled [`SchemaPipeline`] to a user handler, a
//! response formatter and an error handler. It is built once per endpoint and
//! invoked many times; every invocation runs
//!
//! ```text
//! raw event ─► pipeline ─► handler ─► response formatter ─► output
//!                  │           │               │
//!                  └───────────┴───────────────┴─► error handler ─► output | error
//! ```
//!
//! There is exactly one catch boundary per invocation. Whatever the pipeline,
//! the handler or the formatter returns as an error is handed to the error
//! handler, whose result is returned unmodified.
//!
//! # Example
//!
//! ```
//! use hermes_core::{FieldDescriptor, Middleware, MiddlewareConfig};
//! use serde_json::{json, Value};
//!
//! # tokio_test::block_on(async {
//! let config = MiddlewareConfig::<()>::new()
//!     .validator("body", FieldDescriptor::from_schema(json!({ "type": "object" })));
//!
//! let middleware = Middleware::passthrough(config, |event, _ctx| async move {
//!     Ok(event.get("body").cloned().unwrap_or(Value::Null))
//! })
//! .unwrap();
//!
//! let output = middleware.invoke(json!({ "body": { "a": 1 } }), None).await.unwrap();
//! assert_eq!(output, json!({ "a": 1 }));
//! # });
//! ```

use crate::config::MiddlewareConfig;
use crate::error::{ConfigurationError, EventError};
use crate::event::CombinedEvent;
use crate::pipeline::SchemaPipeline;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::error;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased user handler.
pub type HandlerFn<C, R> =
    Arc<dyn Fn(CombinedEvent, Option<C>) -> BoxFuture<'static, anyhow::Result<R>> + Send + Sync>;

/// Shapes a handler result into the adapter's output.
pub type ResponseFn<R, O, C> = Arc<dyn Fn(R, Option<&C>) -> anyhow::Result<O> + Send + Sync>;

/// Converts a caught error into the adapter's output, or rethrows it.
pub type ErrorHandlerFn<O, C> =
    Arc<dyn Fn(anyhow::Error, Option<&C>) -> anyhow::Result<O> + Send + Sync>;

/// A configured middleware instance.
///
/// `C` is the invocation context, `R` the handler result and `O` the output
/// returned to the host.
pub struct Middleware<C, R, O> {
    pipeline: Arc<SchemaPipeline<C>>,
    handler: HandlerFn<C, R>,
    response: ResponseFn<R, O, C>,
    error_handler: ErrorHandlerFn<O, C>,
}

impl<C, R, O> Clone for Middleware<C, R, O> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            handler: Arc::clone(&self.handler),
            response: Arc::clone(&self.response),
            error_handler: Arc::clone(&self.error_handler),
        }
    }
}

impl<C, R, O> std::fmt::Debug for Middleware<C, R, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl<C, R, O> Middleware<C, R, O>
where
    C: Clone + Send + Sync + 'static,
    R: Send + 'static,
    O: Send + 'static,
{
    /// Compiles `config` and binds it to `handler` and `response`.
    ///
    /// The default error handler is installed; see
    /// [`Middleware::with_error_handler`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if a declared schema does not compile.
    pub fn new<H, Fut, F>(
        config: MiddlewareConfig<C>,
        handler: H,
        response: F,
    ) -> Result<Self, ConfigurationError>
    where
        H: Fn(CombinedEvent, Option<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        F: Fn(R, Option<&C>) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        let pipeline = config.compile()?;
        let handler: HandlerFn<C, R> = Arc::new(move |event: CombinedEvent, context: Option<C>| {
            Box::pin(handler(event, context)) as BoxFuture<'static, anyhow::Result<R>>
        });
        Ok(Self {
            pipeline: Arc::new(pipeline),
            handler,
            response: Arc::new(response),
            error_handler: Arc::new(default_error_handler::<O, C>),
        })
    }

    /// Replaces the error handler.
    ///
    /// The replacement fully short-circuits the default mapping: its return
    /// value is the invocation's result.
    #[must_use]
    pub fn with_error_handler<F>(mut self, error_handler: F) -> Self
    where
        F: Fn(anyhow::Error, Option<&C>) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(error_handler);
        self
    }

    /// Returns the compiled pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &SchemaPipeline<C> {
        &self.pipeline
    }

    /// Runs one invocation.
    ///
    /// # Errors
    ///
    /// Returns whatever the error handler returns as an error. With the
    /// default error handler every failure surfaces as an [`EventError`].
    pub async fn invoke(&self, raw: Value, context: Option<C>) -> anyhow::Result<O> {
        match self.run(raw, context.clone()).await {
            Ok(output) => Ok(output),
            Err(error) => (self.error_handler)(error, context.as_ref()),
        }
    }

    async fn run(&self, raw: Value, context: Option<C>) -> anyhow::Result<O> {
        let event = self.pipeline.execute(raw, context.as_ref())?;
        let result = (self.handler)(event, context.clone()).await?;
        (self.response)(result, context.as_ref())
    }

    /// Converts the middleware into a plain function, for hosts that expect
    /// `Fn(event, context) -> Future`.
    pub fn into_fn(self) -> impl Fn(Value, Option<C>) -> BoxFuture<'static, anyhow::Result<O>> + Clone {
        move |raw, context| {
            let middleware = self.clone();
            Box::pin(async move { middleware.invoke(raw, context).await })
        }
    }
}

impl<C, R> Middleware<C, R, R>
where
    C: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    /// Binds `config` to `handler` without response shaping.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if a declared schema does not compile.
    pub fn passthrough<H, Fut>(
        config: MiddlewareConfig<C>,
        handler: H,
    ) -> Result<Self, ConfigurationError>
    where
        H: Fn(CombinedEvent, Option<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        Self::new(config, handler, |result, _context: Option<&C>| Ok(result))
    }
}

/// The default error handler.
///
/// Logs the error, then rethrows an [`EventError`] unchanged and replaces any
/// other error by [`EventError::internal`].
pub fn default_error_handler<O, C>(error: anyhow::Error, _context: Option<&C>) -> anyhow::Result<O> {
    if let Some(event_error) = error.downcast_ref::<EventError>() {
        error!(
            status = event_error.status_code(),
            error_type = %event_error.error_type(),
            message = %event_error.message(),
            "request failed"
        );
        return Err(error);
    }

    error!(error = ?error, "unexpected error");
    hermes_telemetry::record_unexpected_error();
    Err(EventError::internal().into())
}

/// An error handler that rethrows every error untouched.
///
/// Queue adapters use it so batch fan-out observes each item's failure.
pub fn propagate<O, C>(error: anyhow::Error, _context: Option<&C>) -> anyhow::Result<O> {
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn body_config() -> MiddlewareConfig<()> {
        MiddlewareConfig::new().validator(
            "body",
            FieldDescriptor::from_schema(json!({
                "type": "object",
                "properties": { "name": { "type": "string", "minLength": 1 } },
                "required": ["name"]
            })),
        )
    }

    fn echo() -> Middleware<(), Value, Value> {
        Middleware::passthrough(body_config(), |event, _ctx| async move {
            Ok(event.into_value())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_handler_receives_merged_event() {
        let output = echo()
            .invoke(json!({ "body": { "name": "Ana" }, "id": 7 }), None)
            .await
            .unwrap();
        assert_eq!(output, json!({ "body": { "name": "Ana" }, "id": 7 }));
    }

    #[tokio::test]
    async fn test_validation_failure_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let middleware = Middleware::passthrough(body_config(), move |_event, _ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Value::Null) }
        })
        .unwrap();

        let error = middleware
            .invoke(json!({ "body": { "name": "" } }), None)
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let error = error.downcast_ref::<EventError>().unwrap();
        assert_eq!(error.status_code(), 400);
        assert!(error.is_validation());
    }

    #[tokio::test]
    async fn test_domain_error_passes_through() {
        let middleware: Middleware<(), Value, Value> =
            Middleware::passthrough(MiddlewareConfig::new(), |_event, _ctx| async {
                Err(anyhow::Error::from(
                    EventError::new("Resource not found")
                        .with_status_code(404)
                        .with_type("NotFoundException"),
                ))
            })
            .unwrap();

        let error = middleware.invoke(json!({}), None).await.unwrap_err();
        let error = error.downcast_ref::<EventError>().unwrap();
        assert_eq!(error.status_code(), 404);
        assert_eq!(error.error_type(), "NotFoundException");
    }

    #[tokio::test]
    async fn test_unexpected_error_is_normalized() {
        let middleware: Middleware<(), Value, Value> =
            Middleware::passthrough(MiddlewareConfig::new(), |_event, _ctx| async {
                Err(anyhow::anyhow!("connection refused: db.internal:5432"))
            })
            .unwrap();

        let error = middleware.invoke(json!({}), None).await.unwrap_err();
        let error = error.downcast_ref::<EventError>().unwrap();
        assert_eq!(error, &EventError::internal());
    }

    #[tokio::test]
    async fn test_custom_error_handler_short_circuits() {
        let middleware = echo().with_error_handler(|error, _ctx| {
            Ok(json!({ "handled": error.to_string() }))
        });

        let output = middleware
            .invoke(json!({ "body": {} }), None)
            .await
            .unwrap();
        assert_eq!(output, json!({ "handled": "Validation failed at body" }));
    }

    #[tokio::test]
    async fn test_formatter_error_reaches_error_handler() {
        let middleware = Middleware::new(
            MiddlewareConfig::<()>::new(),
            |_event, _ctx| async { Ok(1_u32) },
            |_result, _ctx| -> anyhow::Result<String> { Err(anyhow::anyhow!("unserializable")) },
        )
        .unwrap()
        .with_error_handler(|error, _ctx| Ok(format!("caught: {error}")));

        let output = middleware.invoke(json!({}), None).await.unwrap();
        assert_eq!(output, "caught: unserializable");
    }

    #[tokio::test]
    async fn test_context_reaches_transformer_and_handler() {
        #[derive(Clone)]
        struct Ctx {
            request_id: String,
        }

        let config = MiddlewareConfig::<Ctx>::new()
            .validator("requestId", FieldDescriptor::type_contract::<String>())
            .transformer("requestId", |_event: &Value, ctx: Option<&Ctx>| {
                Ok(json!(ctx.map(|c| c.request_id.clone())))
            });

        let middleware = Middleware::passthrough(config, |event, ctx: Option<Ctx>| async move {
            let from_event: String = event.field("requestId")?;
            let from_ctx = ctx.map(|c| c.request_id).unwrap_or_default();
            Ok::<_, anyhow::Error>(from_event == from_ctx)
        })
        .unwrap();

        let ctx = Ctx {
            request_id: "req-42".to_string(),
        };
        assert!(middleware.invoke(json!({}), Some(ctx)).await.unwrap());
    }

    #[tokio::test]
    async fn test_invocation_is_idempotent() {
        let middleware = echo();
        let raw = json!({ "body": { "name": "Ana" } });

        let first = middleware.invoke(raw.clone(), None).await.unwrap();
        let second = middleware.invoke(raw, None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_propagate_keeps_original_error() {
        let middleware: Middleware<(), Value, Value> =
            Middleware::passthrough(MiddlewareConfig::new(), |_event, _ctx| async {
                Err(anyhow::anyhow!("boom"))
            })
            .unwrap()
            .with_error_handler(propagate);

        let error = middleware.invoke(json!({}), None).await.unwrap_err();
        assert!(error.downcast_ref::<EventError>().is_none());
        assert_eq!(error.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_into_fn() {
        let run = echo().into_fn();
        let output = run(json!({ "body": { "name": "Ana" } }), None).await.unwrap();
        assert_eq!(output["body"]["name"], "Ana");
    }

    #[test]
    fn test_invalid_schema_fails_construction() {
        let config = MiddlewareConfig::<()>::new()
            .validator("body", FieldDescriptor::from_schema(json!({ "type": 12 })));
        let result = Middleware::passthrough(config, |_event, _ctx| async { Ok(()) });
        assert!(result.is_err());
    }
}
