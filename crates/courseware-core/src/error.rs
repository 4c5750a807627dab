//! Error types for Courseware.
//!
//! [`CoursewareError`] is the error every route handler returns. Each variant
//! maps to one [`ErrorCategory`], which fixes the HTTP status and the shape of
//! the client body:
//!
//! | Category | Status | Body |
//! |---|---|---|
//! | `Validation` | 400 | `{"errors": [...]}` |
//! | `Conflict` | 400 | `{"errors": [...]}` |
//! | `Authentication` | 401 | `{"message": "Access Denied"}` |
//! | `Authorization` | 403 | `{"message": ...}` |
//! | `NotFound` | 404 | `{"message": ...}` |
//! | `Internal` | 500 | `{"message": ..., "error": {}}` |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias using [`CoursewareError`].
pub type CoursewareResult<T> = Result<T, CoursewareError>;

/// The only message a client ever sees for an authentication failure.
pub const ACCESS_DENIED_MESSAGE: &str = "Access Denied";

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request body failed one or more field rules.
    Validation,
    /// Missing or invalid credentials.
    Authentication,
    /// Authenticated, but not allowed to touch the resource.
    Authorization,
    /// Resource not found.
    NotFound,
    /// A unique field is already taken.
    Conflict,
    /// Anything unexpected.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    ///
    /// Conflicts are reported as 400 alongside validation failures.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation | Self::Conflict => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Courseware.
///
/// # Example
///
/// ```
/// use courseware_core::{CoursewareError, ErrorCategory};
///
/// fn require_title(title: &str) -> Result<(), CoursewareError> {
///     if title.is_empty() {
///         return Err(CoursewareError::validation(vec![
///             "Please provide a value for \"title\"".to_string(),
///         ]));
///     }
///     Ok(())
/// }
///
/// let err = require_title("").unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::Validation);
/// ```
#[derive(Error, Debug)]
pub enum CoursewareError {
    /// Request validation failed.
    #[error("Validation error: {}", messages.join("; "))]
    Validation {
        /// Every failing rule's message, in rule order.
        messages: Vec<String>,
    },

    /// Authentication failed. The reason is for operators only.
    #[error("Authentication error: {reason}")]
    Authentication {
        /// Detailed reason, never sent to the client.
        reason: String,
    },

    /// Authorization denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// A unique field already holds the submitted value.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// Overrides the default 500 status.
        status: Option<StatusCode>,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl CoursewareError {
    /// Creates a validation error from the collected rule messages.
    #[must_use]
    pub fn validation(messages: Vec<String>) -> Self {
        Self::Validation { messages }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            status: None,
            source: Some(source.into()),
        }
    }

    /// Overrides the status of an internal error. Other variants are unchanged.
    #[must_use]
    pub fn with_status(self, status: StatusCode) -> Self {
        match self {
            Self::Internal {
                message, source, ..
            } => Self::Internal {
                message,
                status: Some(status),
                source,
            },
            other => other,
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal {
                status: Some(status),
                ..
            } => *status,
            _ => self.category().default_status_code(),
        }
    }

    /// Returns `true` if this error is rendered by the global error handler
    /// rather than at the point where it was raised.
    #[must_use]
    pub const fn is_unhandled(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns the message a client may see.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation { messages } => messages.join("; "),
            Self::Authentication { .. } => ACCESS_DENIED_MESSAGE.to_string(),
            Self::Authorization { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Builds the JSON body sent to the client.
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::Validation { messages } => json!({ "errors": messages }),
            Self::Conflict { message } => json!({ "errors": [message] }),
            Self::Internal { message, .. } => json!({ "message": message, "error": {} }),
            _ => json!({ "message": self.client_message() }),
        }
    }
}
