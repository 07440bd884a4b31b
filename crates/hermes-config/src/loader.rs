//! Layered settings loader.
//!
//! Layers apply in order, later ones overriding earlier ones:
//! 1. defaults (or a preset)
//! 2. a TOML or JSON file
//! 3. a `.env` file, feeding the process environment
//! 4. `PREFIX__SECTION__KEY` environment variables

use std::env;
use std::fs;
use std::path::Path;

use hermes_core::ErrorShape;
use hermes_telemetry::LogFormat;

use crate::{ConfigError, HermesConfig};

/// Default environment prefix.
pub const DEFAULT_ENV_PREFIX: &str = "HERMES";

/// Settings loader.
///
/// # Example
///
/// ```no_run
/// use hermes_config::ConfigLoader;
///
/// # fn main() -> Result<(), hermes_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("hermes.toml")?
///     .with_dotenv()?
///     .with_env_prefix("HERMES")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HermesConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader starting from the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HermesConfig::default(),
            env_prefix: None,
        }
    }

    /// Starts from the development preset.
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert!(config.validation.all_errors);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HermesConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HermesConfig::production();
        self
    }

    /// Loads a settings file; the format follows the extension (`.toml` or
    /// `.json`).
    ///
    /// Keys present in the file override the current settings; everything
    /// else, including a preset applied earlier, is kept.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed or
    /// contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Format::from_name)
            .ok_or_else(|| {
                ConfigError::validation_error(format!(
                    "unsupported configuration file format: {}",
                    path.display()
                ))
            })?;

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = format.layer(&self.config, &content)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads settings from a string in the given format (`toml` or `json`).
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[validation]\nall_errors = true\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert!(config.validation.all_errors);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let format = Format::from_name(format).ok_or_else(|| {
            ConfigError::validation_error(format!("unsupported configuration format: {format}"))
        })?;
        self.config = format.layer(&self.config, content)?;
        Ok(self)
    }

    /// Loads `.env` from the working directory (or a parent) into the
    /// process environment. A missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DotenvError` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::DotenvError(e.to_string())),
        }
    }

    /// Enables `PREFIX__SECTION__KEY` environment overrides, e.g.
    /// `HERMES__VALIDATION__ALL_ERRORS=true`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(mut self) -> Result<HermesConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let prefix_marker = format!("{prefix}__");
            for (key, value) in env::vars().filter(|(k, _)| k.starts_with(&prefix_marker)) {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the settings without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HermesConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let boolean = || parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"));

        match parts.as_slice() {
            ["LOGGING", "ENABLED"] => self.config.logging.enabled = boolean()?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value
                    .parse::<LogFormat>()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'json' or 'pretty'"))?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => self.config.logging.include_target = boolean()?,
            ["LOGGING", "FILE_LINE_INFO"] => self.config.logging.file_line_info = boolean()?,

            ["VALIDATION", "ALL_ERRORS"] => self.config.validation.all_errors = boolean()?,
            ["VALIDATION", "VALIDATE_FORMATS"] => {
                self.config.validation.validate_formats = boolean()?;
            }
            ["VALIDATION", "ERROR_SHAPE"] => {
                self.config.validation.error_shape = match value.to_lowercase().as_str() {
                    "simple" => ErrorShape::Simple,
                    "full" => ErrorShape::Full,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'simple' or 'full'")),
                };
            }

            ["HTTP", "DEFAULT_STATUS"] => {
                self.config.http.default_status = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["HTTP", "EXPOSE_INTERNAL_ERRORS"] => {
                self.config.http.expose_internal_errors = boolean()?;
            }

            // Unknown keys belong to other tools sharing the prefix.
            _ => {}
        }

        Ok(())
    }
}

/// Settings file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if name.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// Merges `content` over `current`. Unknown keys are still rejected.
    fn layer(self, current: &HermesConfig, content: &str) -> Result<HermesConfig, ConfigError> {
        match self {
            Self::Toml => {
                let mut base = toml::Value::try_from(current)
                    .map_err(|e| ConfigError::validation_error(e.to_string()))?;
                let layer = toml::from_str::<toml::Table>(content)?;
                merge_toml(&mut base, toml::Value::Table(layer));
                Ok(base.try_into::<HermesConfig>()?)
            }
            Self::Json => {
                let mut base = serde_json::to_value(current)?;
                let layer = serde_json::from_str::<serde_json::Value>(content)?;
                merge_json(&mut base, layer);
                Ok(serde_json::from_value(base)?)
            }
        }
    }
}

fn merge_toml(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base), toml::Value::Table(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn merge_json(base: &mut serde_json::Value, layer: serde_json::Value) {
    match (base, layer) {
        (serde_json::Value::Object(base), serde_json::Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, ignoring case.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
