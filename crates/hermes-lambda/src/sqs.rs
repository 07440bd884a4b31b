//! SQS batch adapter.
//!
//! Every message of a batch runs through its own middleware invocation. A
//! message whose invocation fails (validation, transformer or handler error)
//! is reported by id in the batch response; successful messages are dropped.
//! A failing message never aborts the rest of the batch.
//!
//! | Mode | Scheduling | Failure order |
//! |------|------------|---------------|
//! | [`BatchMode::Parallel`] | all messages at once, joined | message order |
//! | [`BatchMode::Series`] | one at a time, in message order | message order |
//!
//! No response shaping happens here: the handler's result is discarded and
//! errors are rethrown to the batch bookkeeping untouched.

use futures_util::future::join_all;
use hermes_core::{propagate, CombinedEvent, ConfigurationError, Middleware, MiddlewareConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use tracing::{debug, warn};

/// An SQS event delivered to a function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqsEvent {
    /// The batch.
    #[serde(rename = "Records")]
    pub records: Vec<SqsMessage>,
}

/// One SQS message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqsMessage {
    /// Message identifier, reported on failure.
    pub message_id: String,
    /// Raw body.
    #[serde(default)]
    pub body: String,
    /// Receipt handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_handle: Option<String>,
    /// Event source (`aws:sqs`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    /// Remaining fields, passed through opaquely.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial batch failure report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqsBatchResponse {
    /// Failed messages, in message order.
    pub batch_item_failures: Vec<BatchItemFailure>,
}

impl SqsBatchResponse {
    /// Returns the failed message ids.
    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.batch_item_failures
            .iter()
            .map(|failure| failure.item_identifier.as_str())
    }
}

/// One failed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    /// The message id.
    pub item_identifier: String,
}

/// Scheduling of the messages of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Run every message concurrently.
    Parallel,
    /// Run messages one at a time, in order.
    Series,
}

impl BatchMode {
    /// Returns the mode's metric label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Series => "series",
        }
    }
}

/// Decodes a message body: JSON when it parses, the raw string otherwise.
///
/// An absent or empty body decodes to `{}`.
pub fn get_body(record: &Value) -> Value {
    match record.get("body").and_then(Value::as_str) {
        None | Some("") => Value::Object(Map::new()),
        Some(body) => serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())),
    }
}

/// Installs the queue's default transformers underneath `config`'s own.
///
/// Only declared fields receive a default.
#[must_use]
pub fn configure<C: 'static>(config: MiddlewareConfig<C>) -> MiddlewareConfig<C> {
    if config.fields().any(|field| field == "body") {
        config.default_transformer("body", |record: &Value, _context: Option<&C>| Ok(get_body(record)))
    } else {
        config
    }
}

/// A batch handler.
pub struct SqsBatchHandler<C, R> {
    middleware: Middleware<C, R, R>,
    mode: BatchMode,
}

impl<C, R> Clone for SqsBatchHandler<C, R> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
            mode: self.mode,
        }
    }
}

impl<C, R> std::fmt::Debug for SqsBatchHandler<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsBatchHandler")
            .field("middleware", &self.middleware)
            .field("mode", &self.mode)
            .finish()
    }
}

impl<C, R> SqsBatchHandler<C, R>
where
    C: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    /// Builds a batch handler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if a declared schema does not compile.
    pub fn new<H, Fut>(
        config: MiddlewareConfig<C>,
        handler: H,
        mode: BatchMode,
    ) -> Result<Self, ConfigurationError>
    where
        H: Fn(CombinedEvent, Option<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let middleware = Middleware::passthrough(configure(config), handler)?
            .with_error_handler(propagate::<R, C>);
        Ok(Self { middleware, mode })
    }

    /// Returns the scheduling mode.
    #[must_use]
    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Processes a batch and reports the failed messages.
    pub async fn handle(&self, event: SqsEvent, context: Option<C>) -> SqsBatchResponse {
        let total = event.records.len();
        let failed: Vec<String> = match self.mode {
            BatchMode::Parallel => {
                let outcomes = join_all(
                    event
                        .records
                        .iter()
                        .map(|record| self.process(record, context.clone())),
                )
                .await;

                event
                    .records
                    .iter()
                    .zip(outcomes)
                    .filter(|(_, succeeded)| !*succeeded)
                    .map(|(record, _)| record.message_id.clone())
                    .collect()
            }
            BatchMode::Series => {
                let mut failed = Vec::new();
                for record in &event.records {
                    if !self.process(record, context.clone()).await {
                        failed.push(record.message_id.clone());
                    }
                }
                failed
            }
        };

        debug!(
            mode = self.mode.as_str(),
            total,
            failed = failed.len(),
            "batch processed"
        );
        hermes_telemetry::record_batch_item_failures(self.mode.as_str(), failed.len());

        SqsBatchResponse {
            batch_item_failures: failed
                .into_iter()
                .map(|item_identifier| BatchItemFailure { item_identifier })
                .collect(),
        }
    }

    /// Runs one message; returns `false` if it failed.
    async fn process(&self, record: &SqsMessage, context: Option<C>) -> bool {
        let raw = match serde_json::to_value(record) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(message_id = %record.message_id, error = %error, "message could not be encoded");
                return false;
            }
        };

        match self.middleware.invoke(raw, context).await {
            Ok(_) => true,
            Err(error) => {
                warn!(message_id = %record.message_id, error = %error, "message failed");
                false
            }
        }
    }
}

/// Builds a batch handler running every message concurrently.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if a declared schema does not compile.
pub fn parallel<C, R, H, Fut>(
    config: MiddlewareConfig<C>,
    handler: H,
) -> Result<SqsBatchHandler<C, R>, ConfigurationError>
where
    C: Clone + Send + Sync + 'static,
    R: Send + 'static,
    H: Fn(CombinedEvent, Option<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    SqsBatchHandler::new(config, handler, BatchMode::Parallel)
}

/// Builds a batch handler running messages one at a time.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if a declared schema does not compile.
pub fn series<C, R, H, Fut>(
    config: MiddlewareConfig<C>,
    handler: H,
) -> Result<SqsBatchHandler<C, R>, ConfigurationError>
where
    C: Clone + Send + Sync + 'static,
    R: Send + 'static,
    H: Fn(CombinedEvent, Option<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    SqsBatchHandler::new(config, handler, BatchMode::Series)
}
