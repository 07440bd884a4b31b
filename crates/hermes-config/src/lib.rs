//! Deployment settings for Hermes.
//!
//! Endpoints are described in code with
//! [`MiddlewareConfig`](hermes_core::MiddlewareConfig); this crate loads the
//! knobs an operator may want to change without a rebuild:
//!
//! - [`LogConfig`](hermes_telemetry::LogConfig) - log level and format
//! - [`ValidationConfig`] - fail-fast vs all violations, format checks, error shape
//! - [`HttpConfig`] - default status, exposure of internal error messages
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [validation]
//! all_errors = false
//! validate_formats = true
//! error_shape = "simple"
//!
//! [http]
//! default_status = 200
//! expose_internal_errors = false
//! ```
//!
//! Every key can be overridden with `HERMES__SECTION__KEY`, for example
//! `HERMES__VALIDATION__ALL_ERRORS=true`.
//!
//! # Example
//!
//! ```
//! use hermes_config::ConfigLoader;
//! use hermes_core::MiddlewareConfig;
//!
//! let settings = ConfigLoader::new().load().unwrap();
//! let endpoint = MiddlewareConfig::<()>::new()
//!     .engine_options(settings.engine_options())
//!     .error_shape(settings.error_shape());
//! # let _ = endpoint;
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{HermesConfig, HttpConfig, ValidationConfig};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
