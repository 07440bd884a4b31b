//! Schema validation engine.
//!
//! A [`ValidationEngine`] turns declarative JSON Schemas into
//! [`CompiledValidator`]s. The engine is owned by one compiled middleware
//! configuration and is only created when at least one declared field carries
//! a schema; every validator it produces is shared by all invocations of that
//! configuration.
//!
//! # Example
//!
//! ```
//! use hermes_core::engine::{EngineOptions, ValidationEngine};
//! use serde_json::json;
//!
//! let engine = ValidationEngine::new(EngineOptions::default().all_errors(true));
//! let validator = engine
//!     .compile(&json!({ "type": "string", "minLength": 1 }))
//!     .unwrap();
//!
//! assert!(validator.validate(&json!("hello")).is_ok());
//! let violations = validator.validate(&json!("")).unwrap_err();
//! assert_eq!(violations[0].keyword, "minLength");
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// A single schema violation.
///
/// Serializes with camelCase keys; this is the raw detail shape used by
/// [`ErrorShape::Full`](crate::ErrorShape::Full).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// JSON pointer to the offending value (empty for the value itself).
    pub instance_path: String,
    /// JSON pointer to the schema keyword that failed.
    pub schema_path: String,
    /// The violated keyword (`minLength`, `format`, `required`, ...).
    pub keyword: String,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A named format predicate.
pub type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options passed to the schema compiler.
#[derive(Clone)]
pub struct EngineOptions {
    all_errors: bool,
    validate_formats: bool,
    formats: IndexMap<String, FormatCheck>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            all_errors: false,
            validate_formats: true,
            formats: IndexMap::new(),
        }
    }
}

impl std::fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("all_errors", &self.all_errors)
            .field("validate_formats", &self.validate_formats)
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EngineOptions {
    /// Collect every violation instead of stopping at the first one.
    #[must_use]
    pub fn all_errors(mut self, all_errors: bool) -> Self {
        self.all_errors = all_errors;
        self
    }

    /// Enables or disables `format` assertions (enabled by default).
    #[must_use]
    pub fn validate_formats(mut self, validate: bool) -> Self {
        self.validate_formats = validate;
        self
    }

    /// Registers a custom format usable as `"format": "<name>"`.
    #[must_use]
    pub fn with_format<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.formats.insert(name.into(), Arc::new(check));
        self
    }

    /// Returns whether every violation is collected.
    #[must_use]
    pub fn collects_all_errors(&self) -> bool {
        self.all_errors
    }

    /// Returns whether `format` keywords are asserted.
    #[must_use]
    pub fn validates_formats(&self) -> bool {
        self.validate_formats
    }
}

/// Compiles declarative schemas into validators.
#[derive(Debug)]
pub struct ValidationEngine {
    options: EngineOptions,
}

impl ValidationEngine {
    /// Creates an engine with the given options.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        debug!(
            all_errors = options.all_errors,
            validate_formats = options.validate_formats,
            custom_formats = options.formats.len(),
            "validation engine initialized"
        );
        Self { options }
    }

    /// Returns the options this engine compiles with.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compiles a schema.
    ///
    /// # Errors
    ///
    /// Returns the compiler diagnostic if `schema` is not a valid JSON Schema.
    pub fn compile(&self, schema: &Value) -> Result<CompiledValidator, String> {
        let mut builder = jsonschema::options().should_validate_formats(self.options.validate_formats);
        for (name, check) in &self.options.formats {
            let check = Arc::clone(check);
            builder = builder.with_format(name.clone(), move |value: &str| check(value));
        }

        let validator = builder.build(schema).map_err(|e| e.to_string())?;
        let limit = if self.options.all_errors { usize::MAX } else { 1 };

        Ok(CompiledValidator::from_fn(move |value| {
            let violations: Vec<Violation> = validator
                .iter_errors(value)
                .take(limit)
                .map(|error| {
                    let schema_path = error.schema_path.to_string();
                    let keyword = schema_path.rsplit('/').next().unwrap_or_default().to_string();
                    Violation {
                        instance_path: error.instance_path.to_string(),
                        schema_path,
                        keyword,
                        message: Some(error.to_string()),
                    }
                })
                .collect();

            if violations.is_empty() {
                Ok(())
            } else {
                Err(violations)
            }
        }))
    }
}

/// A compiled, shareable validation function.
#[derive(Clone)]
pub struct CompiledValidator {
    check: Arc<dyn Fn(&Value) -> Result<(), Vec<Violation>> + Send + Sync>,
}

impl std::fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledValidator").finish_non_exhaustive()
    }
}

impl CompiledValidator {
    /// Wraps an arbitrary check function.
    pub fn from_fn<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), Vec<Violation>> + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
        }
    }

    /// Validates a value.
    ///
    /// # Errors
    ///
    /// Returns the (non-empty) list of violations when `value` fails.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<Violation>> {
        (self.check)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "email": { "type": "string", "format": "email" }
            },
            "required": ["name", "email"]
        })
    }

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert!(!options.collects_all_errors());
        assert!(options.validates_formats());
    }

    #[test]
    fn test_valid_value_passes() {
        let engine = ValidationEngine::new(EngineOptions::default());
        let validator = engine.compile(&user_schema()).unwrap();
        assert!(validator
            .validate(&json!({ "name": "Ana", "email": "ana@example.com" }))
            .is_ok());
    }

    #[test]
    fn test_stops_at_first_violation_by_default() {
        let engine = ValidationEngine::new(EngineOptions::default());
        let validator = engine.compile(&user_schema()).unwrap();
        let violations = validator
            .validate(&json!({ "name": "", "email": "nope" }))
            .unwrap_err();
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_all_errors_collects_every_violation() {
        let engine = ValidationEngine::new(EngineOptions::default().all_errors(true));
        let validator = engine.compile(&user_schema()).unwrap();
        let violations = validator
            .validate(&json!({ "name": "", "email": "nope" }))
            .unwrap_err();

        assert_eq!(violations.len(), 2);
        let name = violations.iter().find(|v| v.instance_path == "/name").unwrap();
        assert_eq!(name.keyword, "minLength");
        let email = violations.iter().find(|v| v.instance_path == "/email").unwrap();
        assert_eq!(email.keyword, "format");
        assert!(email.message.is_some());
    }

    #[test]
    fn test_required_violation_points_at_root() {
        let engine = ValidationEngine::new(EngineOptions::default());
        let validator = engine.compile(&user_schema()).unwrap();
        let violations = validator.validate(&json!({ "name": "Ana" })).unwrap_err();
        assert_eq!(violations[0].instance_path, "");
        assert_eq!(violations[0].keyword, "required");
    }

    #[test]
    fn test_formats_can_be_disabled() {
        let engine = ValidationEngine::new(EngineOptions::default().validate_formats(false));
        let validator = engine.compile(&user_schema()).unwrap();
        assert!(validator
            .validate(&json!({ "name": "Ana", "email": "nope" }))
            .is_ok());
    }

    #[test]
    fn test_custom_format() {
        let options = EngineOptions::default().with_format("slug", |value: &str| {
            !value.is_empty() && value.chars().all(|c| c.is_ascii_lowercase() || c == '-')
        });
        let engine = ValidationEngine::new(options);
        let validator = engine
            .compile(&json!({ "type": "string", "format": "slug" }))
            .unwrap();

        assert!(validator.validate(&json!("hello-world")).is_ok());
        let violations = validator.validate(&json!("Hello World")).unwrap_err();
        assert_eq!(violations[0].keyword, "format");
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let engine = ValidationEngine::new(EngineOptions::default());
        assert!(engine.compile(&json!({ "type": 12 })).is_err());
    }
}
