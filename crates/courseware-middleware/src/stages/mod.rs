//! Pipeline stages.
//!
//! All five stages run before the handler, in this order:
//!
//! 1. [`request_id`] - Assign the request ID and echo it on the response
//! 2. [`telemetry`] - Log one completion event per request
//! 3. [`error_handler`] - Render unhandled errors
//! 4. [`authentication`] - Basic credentials for protected operations
//! 5. [`validation`] - Per-operation field rules

pub mod authentication;
pub mod error_handler;
pub mod request_id;
pub mod telemetry;
pub mod validation;

pub use authentication::AuthenticationMiddleware;
pub use error_handler::{ErrorHandlerMiddleware, UnhandledError};
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use telemetry::{RequestTelemetry, TelemetryMiddleware};
pub use validation::{Check, Rule, RuleSet, ValidationMiddleware};
