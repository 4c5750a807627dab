//! Logging setup for Courseware services.
//!
//! Courseware logs through `tracing` macros with structured fields. This
//! crate installs the global subscriber that turns those events into output:
//! JSON lines in production, pretty output during development.
//!
//! Request-level events are emitted by the telemetry middleware stage; this
//! crate only decides where they go.
//!
//! # Example
//!
//! ```rust,ignore
//! use courseware_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::new("courseware").in_environment("production");
//!
//! init_telemetry(&config)?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{TelemetryConfig, SERVICE_VERSION};
pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installs logging and records the service identity.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;

    tracing::info!(
        service = %config.service_name,
        version = SERVICE_VERSION,
        environment = %config.environment,
        log_format = %config.logging.format,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_logging_disabled() {
        let config = TelemetryConfig::default().with_logging(LogConfig {
            enabled: false,
            ..LogConfig::default()
        });

        assert!(init_telemetry(&config).is_ok());
    }
}
