//! Telemetry configuration.

use crate::logging::LogConfig;

/// Crate version reported in the startup event.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Who is logging, and how.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Attached to the startup event.
    pub service_name: String,
    /// `development`, `staging`, `production` or anything else.
    pub environment: String,
    /// Subscriber settings.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// A development configuration for `service_name` with default logging.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            environment: "development".to_string(),
            logging: LogConfig::default(),
        }
    }

    /// Replaces the environment label.
    #[must_use]
    pub fn in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Replaces the logging settings.
    #[must_use]
    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = logging;
        self
    }

    /// `true` outside of `development`.
    pub fn is_deployed(&self) -> bool {
        self.environment != "development"
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new("courseware")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;

    #[test]
    fn test_default_is_development() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "courseware");
        assert!(!config.is_deployed());
    }

    #[test]
    fn test_overrides() {
        let config = TelemetryConfig::new("courseware-api")
            .in_environment("production")
            .with_logging(LogConfig::development());

        assert_eq!(config.service_name, "courseware-api");
        assert!(config.is_deployed());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
