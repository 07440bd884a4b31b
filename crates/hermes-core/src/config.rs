//! Middleware configuration and schema resolution.
//!
//! A [`MiddlewareConfig`] is built once per logical endpoint and compiled into
//! a [`SchemaPipeline`]. Compilation is where descriptors are resolved: static
//! contracts get no validator, schemas are compiled by a
//! [`ValidationEngine`] that is created on the first schema encountered and
//! never again.
//!
//! # Example
//!
//! ```
//! use hermes_core::{FieldDescriptor, MiddlewareConfig};
//! use serde_json::json;
//!
//! let pipeline = MiddlewareConfig::<()>::new()
//!     .validator("body", FieldDescriptor::from_schema(json!({ "type": "object" })))
//!     .validator("headers", FieldDescriptor::type_contract::<serde_json::Value>())
//!     .compile()
//!     .unwrap();
//!
//! assert_eq!(pipeline.len(), 2);
//! assert!(pipeline.has_engine());
//! ```

use crate::descriptor::FieldDescriptor;
use crate::engine::{EngineOptions, ValidationEngine};
use crate::error::{ConfigurationError, ErrorShape};
use crate::pipeline::{SchemaAction, SchemaPipeline};
use crate::transformer::TransformerRegistry;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

/// Declared fields, transformers and validation options for one endpoint.
pub struct MiddlewareConfig<C> {
    validators: IndexMap<String, FieldDescriptor>,
    transformers: TransformerRegistry<C>,
    engine_options: EngineOptions,
    error_shape: ErrorShape,
}

impl<C> std::fmt::Debug for MiddlewareConfig<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareConfig")
            .field("validators", &self.validators)
            .field("transformers", &self.transformers)
            .field("engine_options", &self.engine_options)
            .field("error_shape", &self.error_shape)
            .finish()
    }
}

impl<C: 'static> Default for MiddlewareConfig<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> MiddlewareConfig<C> {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: IndexMap::new(),
            transformers: TransformerRegistry::new(),
            engine_options: EngineOptions::default(),
            error_shape: ErrorShape::default(),
        }
    }

    /// Declares a field.
    ///
    /// Fields are checked in declaration order. Declaring the same field
    /// twice replaces the descriptor but keeps the original position.
    #[must_use]
    pub fn validator(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.validators.insert(name.into(), descriptor);
        self
    }

    /// Registers the transformer for a declared field.
    #[must_use]
    pub fn transformer<F>(mut self, name: impl Into<String>, transformer: F) -> Self
    where
        F: Fn(&Value, Option<&C>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.transformers.insert(name, transformer);
        self
    }

    /// Registers a transformer unless the caller already registered one.
    #[must_use]
    pub fn default_transformer<F>(mut self, name: impl Into<String>, transformer: F) -> Self
    where
        F: Fn(&Value, Option<&C>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.transformers.insert_default(name, transformer);
        self
    }

    /// Sets the schema compiler options.
    #[must_use]
    pub fn engine_options(mut self, options: EngineOptions) -> Self {
        self.engine_options = options;
        self
    }

    /// Selects the detail shape of validation errors.
    #[must_use]
    pub fn error_shape(mut self, shape: ErrorShape) -> Self {
        self.error_shape = shape;
        self
    }

    /// Returns the declared field names in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// Resolves every descriptor and compiles the schema fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSchema`] if a declared schema
    /// does not compile.
    pub fn compile(self) -> Result<SchemaPipeline<C>, ConfigurationError> {
        let mut engine: Option<ValidationEngine> = None;
        let mut actions = Vec::with_capacity(self.validators.len());

        for (name, descriptor) in &self.validators {
            let validator = match descriptor.schema() {
                Some(schema) => {
                    let engine = engine
                        .get_or_insert_with(|| ValidationEngine::new(self.engine_options.clone()));
                    let compiled = engine.compile(schema).map_err(|message| {
                        ConfigurationError::InvalidSchema {
                            field: name.clone(),
                            message,
                        }
                    })?;
                    Some(compiled)
                }
                None => None,
            };

            debug!(
                field = %name,
                kind = descriptor.kind(),
                transformed = self.transformers.contains(name),
                "schema action resolved"
            );
            actions.push(SchemaAction::new(
                name.clone(),
                self.transformers.resolve(name),
                validator,
            ));
        }

        for name in self.transformers.names() {
            if !self.validators.contains_key(name) {
                warn!(field = %name, "transformer registered for an undeclared field is ignored");
            }
        }

        Ok(SchemaPipeline::new(actions, engine, self.error_shape))
    }
}
