//! Telemetry error types.

use thiserror::Error;

/// Errors raised while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level filter does not parse.
    #[error("Invalid log level '{level}': {reason}")]
    InvalidLevel {
        /// The rejected filter.
        level: String,
        /// Parser message.
        reason: String,
    },

    /// The output format is not `json` or `pretty`.
    #[error("Invalid log format '{0}', expected 'json' or 'pretty'")]
    InvalidFormat(String),

    /// A global subscriber is already installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}
