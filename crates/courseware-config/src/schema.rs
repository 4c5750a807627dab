//! Configuration schema types.
//!
//! One struct per section. Every section rejects unknown keys and fills
//! missing ones from its defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// ```
/// use courseware_config::ServerSection;
///
/// let section = ServerSection::default();
/// assert_eq!(section.http_addr, "0.0.0.0:5000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// HTTP bind address (e.g., "0.0.0.0:5000").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerSection {
    /// Shutdown timeout as a [`Duration`].
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Log output format as it appears in configuration files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable.
    Pretty,
}

impl From<LogFormat> for courseware_telemetry::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Install a subscriber at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (`info`, `courseware=debug,hyper=warn`, ...).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line in events.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name attached to logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            logging: LoggingSection::default(),
        }
    }
}

impl TelemetrySection {
    /// Converts this section into the telemetry crate's configuration.
    #[must_use]
    pub fn to_telemetry_config(&self) -> courseware_telemetry::TelemetryConfig {
        let logging = courseware_telemetry::LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format.into(),
            include_location: self.logging.include_location,
            include_target: true,
        };
        courseware_telemetry::TelemetryConfig::new(self.service_name.clone())
            .in_environment(self.environment.clone())
            .with_logging(logging)
    }
}

fn default_service_name() -> String {
    "courseware".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

/// Security configuration section.
///
/// The hash costs are argon2id parameters used for newly stored secrets.
/// Existing hashes carry their own parameters and verify regardless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SecuritySection {
    /// Memory cost in KiB.
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,

    /// Number of passes.
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,

    /// Degree of parallelism.
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,

    /// Reuse an incoming `x-request-id` instead of generating one.
    #[serde(default)]
    pub trust_request_id: bool,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            hash_memory_kib: default_hash_memory(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
            trust_request_id: false,
        }
    }
}

// argon2 crate defaults
fn default_hash_memory() -> u32 {
    19 * 1024
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_hash_parallelism() -> u32 {
    1
}

/// Error reporting section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ErrorsSection {
    /// Log unhandled errors with their full chain.
    #[serde(default)]
    pub log_errors: bool,
}

/// Store section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// JSON file of users and courses loaded at startup.
    #[serde(default)]
    pub seed_file: Option<String>,
}

fn default_true() -> bool {
    true
}
