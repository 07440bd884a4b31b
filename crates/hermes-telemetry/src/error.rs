//! Errors raised while setting up logging.

use thiserror::Error;

/// A logging setup failure.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A setting has an unusable value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
