//! Errors raised while assembling a [`CoursewareConfig`](crate::CoursewareConfig).

use std::path::PathBuf;
use thiserror::Error;

/// A configuration layer could not be applied, or the result is unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("no config file at {path}")]
    MissingFile {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {path}")]
    Unreadable {
        /// File path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or a key no section knows about.
    #[error("bad TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or a key no section knows about.
    #[error("bad JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A setting parsed but is out of range.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted setting path, such as `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment override could not be parsed.
    #[error("environment variable {var}: {reason}")]
    BadEnvVar {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// The loader was asked for something it cannot do.
    #[error("{0}")]
    Unsupported(String),
}

impl ConfigError {
    pub(crate) fn missing_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// A setting with a bad value.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn bad_env_var(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadEnvVar {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
