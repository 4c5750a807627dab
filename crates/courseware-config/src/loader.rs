//! Layered configuration loading.
//!
//! Layers, later ones winning:
//! 1. Defaults
//! 2. A TOML or JSON file
//! 3. Environment variables, optionally seeded from a `.env` file

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, CoursewareConfig, LogFormat};

/// Overrides the port of `server.http_addr`.
pub const PORT_VAR: &str = "PORT";

/// Turns on `errors.log_errors` when set to `true`.
pub const ERROR_LOGGING_VAR: &str = "ENABLE_GLOBAL_ERROR_LOGGING";

/// Configuration loader.
///
/// ```no_run
/// use courseware_config::ConfigLoader;
///
/// # fn main() -> Result<(), courseware_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("courseware.toml")?
///     .with_dotenv()
///     .with_env_prefix("COURSEWARE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: CoursewareConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CoursewareConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Load a configuration file. The format follows the extension
    /// (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unsupported extension, or fails to parse (unknown keys included).
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::missing_file(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::unreadable(path, e))?;
        let file_config = Self::parse_file(&content, path)?;
        self.merge_config(file_config);
        self.file_loaded = true;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Whether a file layer was applied.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Load configuration from a string in `format` (`toml` or `json`).
    ///
    /// ```
    /// use courseware_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[errors]\nlog_errors = true", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.errors.log_errors);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let file_config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::Unsupported(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        self.merge_config(file_config);
        Ok(self)
    }

    /// Set the prefix for `PREFIX__SECTION__KEY` overrides.
    ///
    /// Setting a prefix also enables the `PORT` and
    /// `ENABLE_GLOBAL_ERROR_LOGGING` variables.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load `.env` from the working directory into the process environment,
    /// if one exists. Variables already set are left alone.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or the final
    /// configuration is invalid.
    pub fn load(mut self) -> Result<CoursewareConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    fn parse_file(content: &str, path: &Path) -> Result<CoursewareConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::Unsupported(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    // Sections missing from the file take their defaults.
    fn merge_config(&mut self, file_config: CoursewareConfig) {
        self.config = file_config;
    }

    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        let mut port = None;

        for (key, value) in vars {
            if key == PORT_VAR {
                port = Some(value);
            } else if key == ERROR_LOGGING_VAR {
                if value == "true" {
                    self.config.errors.log_errors = true;
                }
            } else if key.starts_with(prefix) {
                self.apply_env_var(&key, &value, prefix)?;
            }
        }

        // after the prefixed vars so it patches the final address
        if let Some(port) = port {
            self.apply_port(&port)?;
        }

        Ok(())
    }

    fn apply_port(&mut self, value: &str) -> Result<(), ConfigError> {
        let port: u16 = value
            .parse()
            .map_err(|_| ConfigError::bad_env_var(PORT_VAR, "expected port number"))?;
        let mut addr = self.config.socket_addr()?;
        addr.set_port(port);
        self.config.server.http_addr = addr.to_string();
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__"))
        else {
            // e.g. COURSEWARE_CONFIG
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => {
                self.config.server.http_addr = value.to_string();
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                self.config.server.request_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                self.config.server.max_body_bytes = parse_number(key, value)?;
            }

            ["TELEMETRY", "SERVICE_NAME"] => {
                self.config.telemetry.service_name = value.to_string();
            }
            ["TELEMETRY", "ENVIRONMENT"] => {
                self.config.telemetry.environment = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                self.config.telemetry.logging.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                self.config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                self.config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::bad_env_var(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                self.config.telemetry.logging.include_location = parse_flag(key, value)?;
            }

            ["SECURITY", "HASH_MEMORY_KIB"] => {
                self.config.security.hash_memory_kib = parse_number(key, value)?;
            }
            ["SECURITY", "HASH_ITERATIONS"] => {
                self.config.security.hash_iterations = parse_number(key, value)?;
            }
            ["SECURITY", "HASH_PARALLELISM"] => {
                self.config.security.hash_parallelism = parse_number(key, value)?;
            }
            ["SECURITY", "TRUST_REQUEST_ID"] => {
                self.config.security.trust_request_id = parse_flag(key, value)?;
            }

            ["ERRORS", "LOG_ERRORS"] => {
                self.config.errors.log_errors = parse_flag(key, value)?;
            }

            ["STORE", "SEED_FILE"] => {
                self.config.store.seed_file = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::bad_env_var(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::bad_env_var(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
