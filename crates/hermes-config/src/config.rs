//! Settings types.

use hermes_core::{EngineOptions, ErrorShape};
use hermes_lambda::{ErrorMapper, ResponseOptions};
use hermes_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Deployment settings for a Hermes function.
///
/// Endpoint shape (declared fields, transformers, formatters) stays in code;
/// these settings tune how validation and error responses behave.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert!(!config.validation.all_errors);
/// assert_eq!(config.http.default_status, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,

    /// Schema validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// HTTP response settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Schema validation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Report every violation instead of stopping at the first.
    pub all_errors: bool,

    /// Check `format` keywords (`email`, `date-time`, ...).
    pub validate_formats: bool,

    /// Shape of the `details` array of validation errors.
    pub error_shape: ErrorShape,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            all_errors: false,
            validate_formats: true,
            error_shape: ErrorShape::Simple,
        }
    }
}

/// HTTP response settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Status code of successful JSON responses.
    pub default_status: u16,

    /// Put the original message of unexpected errors in 500 responses.
    pub expose_internal_errors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            default_status: 200,
            expose_internal_errors: false,
        }
    }
}

impl HermesConfig {
    /// Development preset: pretty debug logs, every violation reported and
    /// internal error messages exposed.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            validation: ValidationConfig {
                all_errors: true,
                ..ValidationConfig::default()
            },
            http: HttpConfig {
                expose_internal_errors: true,
                ..HttpConfig::default()
            },
        }
    }

    /// Production preset: JSON logs, fail-fast validation, internal errors
    /// hidden.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the status code is outside
    /// `100..=599` or the log level is empty while logging is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=599).contains(&self.http.default_status) {
            return Err(ConfigError::invalid_value(
                "http.default_status",
                format!("{} is not between 100 and 599", self.http.default_status),
            ));
        }

        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                "must not be empty when logging is enabled",
            ));
        }

        Ok(())
    }

    /// Builds the schema engine options for [`MiddlewareConfig::engine_options`].
    ///
    /// [`MiddlewareConfig::engine_options`]: hermes_core::MiddlewareConfig::engine_options
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::default()
            .all_errors(self.validation.all_errors)
            .validate_formats(self.validation.validate_formats)
    }

    /// Returns the configured validation error shape.
    #[must_use]
    pub fn error_shape(&self) -> ErrorShape {
        self.validation.error_shape
    }

    /// Builds the gateway error mapper.
    #[must_use]
    pub fn error_mapper(&self) -> ErrorMapper {
        ErrorMapper::new().expose_internal_errors(self.http.expose_internal_errors)
    }

    /// Builds the options of the default JSON formatter.
    #[must_use]
    pub fn response_options(&self) -> ResponseOptions {
        ResponseOptions::new().status_code(self.http.default_status)
    }
}
