//! The root [`CoursewareConfig`] and its builder.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, ErrorsSection, SecuritySection, ServerSection, StoreSection, TelemetrySection,
};

/// Complete Courseware configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// ```
/// use courseware_config::CoursewareConfig;
///
/// let config = CoursewareConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:5000");
/// assert!(!config.errors.log_errors);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CoursewareConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Service identity and logging.
    #[serde(default)]
    pub telemetry: TelemetrySection,

    /// Secret hashing and request id trust.
    #[serde(default)]
    pub security: SecuritySection,

    /// Unhandled error reporting.
    #[serde(default)]
    pub errors: ErrorsSection,

    /// Initial data.
    #[serde(default)]
    pub store: StoreSection,
}

impl CoursewareConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> CoursewareConfigBuilder {
        CoursewareConfigBuilder::new()
    }

    /// Parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when `server.http_addr` is not a
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the server address does not parse
    /// - the body limit or a timeout is zero
    /// - a hash cost is zero
    /// - the log level is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        for (field, value) in [
            ("security.hash_memory_kib", self.security.hash_memory_kib),
            ("security.hash_iterations", self.security.hash_iterations),
            ("security.hash_parallelism", self.security.hash_parallelism),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }
        // argon2 needs at least 8 KiB per lane
        if self.security.hash_memory_kib < 8 * self.security.hash_parallelism {
            return Err(ConfigError::invalid(
                "security.hash_memory_kib",
                "must be at least 8 times security.hash_parallelism",
            ));
        }

        if self.telemetry.logging.enabled {
            courseware_telemetry::create_env_filter(&self.telemetry.logging.level).map_err(
                |e| ConfigError::invalid("telemetry.logging.level", e.to_string()),
            )?;
        }

        Ok(())
    }
}

/// Builder for [`CoursewareConfig`].
#[derive(Debug, Default)]
pub struct CoursewareConfigBuilder {
    server: Option<ServerSection>,
    telemetry: Option<TelemetrySection>,
    security: Option<SecuritySection>,
    errors: Option<ErrorsSection>,
    store: Option<StoreSection>,
}

impl CoursewareConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerSection) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Set the security section.
    #[must_use]
    pub fn security(mut self, security: SecuritySection) -> Self {
        self.security = Some(security);
        self
    }

    /// Set the errors section.
    #[must_use]
    pub fn errors(mut self, errors: ErrorsSection) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Set the store section.
    #[must_use]
    pub fn store(mut self, store: StoreSection) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> CoursewareConfig {
        CoursewareConfig {
            server: self.server.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
            security: self.security.unwrap_or_default(),
            errors: self.errors.unwrap_or_default(),
            store: self.store.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CoursewareConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = CoursewareConfig::builder()
            .server(ServerSection {
                http_addr: "localhost".to_string(),
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_zero_hash_cost_rejected() {
        let config = CoursewareConfig::builder()
            .security(SecuritySection {
                hash_iterations: 0,
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("security.hash_iterations"));
    }

    #[test]
    fn test_memory_below_lane_minimum_rejected() {
        let config = CoursewareConfig::builder()
            .security(SecuritySection {
                hash_memory_kib: 8,
                hash_parallelism: 2,
                ..Default::default()
            })
            .build();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = CoursewareConfig::default();
        config.telemetry.logging.level = "courseware=loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("telemetry.logging.level"));

        config.telemetry.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_keeps_unset_defaults() {
        let config = CoursewareConfig::builder()
            .errors(ErrorsSection { log_errors: true })
            .build();
        assert!(config.errors.log_errors);
        assert_eq!(config.server, ServerSection::default());
    }
}
