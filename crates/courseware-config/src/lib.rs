//! Typed configuration for Courseware.
//!
//! - TOML and JSON configuration files
//! - `.env` files via `dotenvy`
//! - Environment variable overrides
//! - Strict parsing (unknown keys are errors)
//!
//! # Example
//!
//! ```no_run
//! use courseware_config::ConfigLoader;
//!
//! # fn main() -> Result<(), courseware_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("courseware.toml")?
//!     .with_dotenv()
//!     .with_env_prefix("COURSEWARE")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:5000"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 1048576
//!
//! [telemetry]
//! service_name = "courseware"
//! environment = "production"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [security]
//! hash_memory_kib = 19456
//! hash_iterations = 2
//! hash_parallelism = 1
//! trust_request_id = false
//!
//! [errors]
//! log_errors = false
//!
//! [store]
//! seed_file = "seed.json"
//! ```
//!
//! # Environment overrides
//!
//! With a prefix of `COURSEWARE`, any key can be set as
//! `COURSEWARE__SECTION__KEY`, e.g. `COURSEWARE__ERRORS__LOG_ERRORS=true`.
//! `PORT` replaces the port of `server.http_addr` and
//! `ENABLE_GLOBAL_ERROR_LOGGING=true` turns on error logging.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{CoursewareConfig, CoursewareConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, ERROR_LOGGING_VAR, PORT_VAR};
pub use schema::*;
