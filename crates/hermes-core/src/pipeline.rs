//! The validation pipeline.
//!
//! A [`SchemaPipeline`] holds one [`SchemaAction`] per declared field, in
//! declaration order. For every invocation it runs each action's transformer,
//! then its validator (if any), and records the value as an override. The
//! first failing field aborts the invocation; no partial event is produced.

use crate::engine::{CompiledValidator, ValidationEngine};
use crate::error::{ErrorShape, EventError};
use crate::event::{merge, CombinedEvent};
use crate::transformer::Transformer;
use serde_json::{Map, Value};
use tracing::debug;

/// The resolved triple for one declared field.
pub struct SchemaAction<C> {
    name: String,
    transformer: Transformer<C>,
    validator: Option<CompiledValidator>,
}

impl<C> std::fmt::Debug for SchemaAction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaAction")
            .field("name", &self.name)
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

impl<C> SchemaAction<C> {
    /// Creates an action.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        transformer: Transformer<C>,
        validator: Option<CompiledValidator>,
    ) -> Self {
        Self {
            name: name.into(),
            transformer,
            validator,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if values are checked at runtime.
    #[must_use]
    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// Transforms and validates this field.
    fn apply(&self, raw: &Value, context: Option<&C>, shape: ErrorShape) -> anyhow::Result<Value> {
        let data = (self.transformer)(raw, context)?;

        if let Some(validator) = &self.validator {
            if let Err(violations) = validator.validate(&data) {
                debug!(
                    location = %self.name,
                    violations = violations.len(),
                    "field validation failed"
                );
                hermes_telemetry::record_validation_failure(&self.name);
                return Err(EventError::validation(&self.name, &violations, shape).into());
            }
        }

        Ok(data)
    }
}

/// The compiled per-field pipeline of one middleware configuration.
pub struct SchemaPipeline<C> {
    actions: Vec<SchemaAction<C>>,
    engine: Option<ValidationEngine>,
    error_shape: ErrorShape,
}

impl<C> std::fmt::Debug for SchemaPipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaPipeline")
            .field("actions", &self.actions)
            .field("engine", &self.engine)
            .field("error_shape", &self.error_shape)
            .finish()
    }
}

impl<C> SchemaPipeline<C> {
    /// Creates a pipeline from resolved actions.
    #[must_use]
    pub fn new(
        actions: Vec<SchemaAction<C>>,
        engine: Option<ValidationEngine>,
        error_shape: ErrorShape,
    ) -> Self {
        debug!(
            fields = actions.len(),
            engine = engine.is_some(),
            "schema pipeline compiled"
        );
        Self {
            actions,
            engine,
            error_shape,
        }
    }

    /// Computes the override of every declared field.
    ///
    /// # Errors
    ///
    /// Returns the transformer's error, or an [`EventError`] validation error
    /// for the first field that fails its schema.
    pub fn overrides(&self, raw: &Value, context: Option<&C>) -> anyhow::Result<Map<String, Value>> {
        let mut overrides = Map::new();
        for action in &self.actions {
            let data = action.apply(raw, context, self.error_shape)?;
            overrides.insert(action.name.clone(), data);
        }
        Ok(overrides)
    }

    /// Validates `raw` and merges the overrides into it.
    ///
    /// # Errors
    ///
    /// See [`SchemaPipeline::overrides`].
    pub fn execute(&self, raw: Value, context: Option<&C>) -> anyhow::Result<CombinedEvent> {
        let overrides = self.overrides(&raw, context)?;
        Ok(merge(raw, overrides))
    }

    /// Returns the actions in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[SchemaAction<C>] {
        &self.actions
    }

    /// Returns `true` if a validation engine was created.
    #[must_use]
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Returns the detail shape of validation errors.
    #[must_use]
    pub fn error_shape(&self) -> ErrorShape {
        self.error_shape
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if no field is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
