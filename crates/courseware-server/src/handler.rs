//! Handler registration and dispatch.
//!
//! Handlers are async functions registered under an operation ID. They take
//! the immutable [`RequestContext`] built by the middleware pipeline and,
//! optionally, a JSON body deserialized into a typed request. They return a
//! [`Reply`] or a [`CoursewareError`].
//!
//! # Example
//!
//! ```rust
//! use courseware_core::{CoursewareError, RequestContext};
//! use courseware_server::{HandlerRegistry, Reply};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Rename {
//!     title: String,
//! }
//!
//! async fn rename(_ctx: RequestContext, body: Rename) -> Result<Reply, CoursewareError> {
//!     Reply::ok(&serde_json::json!({ "title": body.title }))
//! }
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("renameCourse", rename);
//! assert!(registry.contains("renameCourse"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use courseware_core::{CoursewareError, RequestContext};
use courseware_middleware::{Response, ResponseExt};
use http::header::{HeaderValue, LOCATION};
use http::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// What every handler returns.
pub type HandlerResult = Result<Reply, CoursewareError>;

/// Boxed handler future.
pub type BoxedHandlerResult = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A type-erased handler.
pub type ErasedHandler = Arc<dyn Fn(RequestContext, Bytes) -> BoxedHandlerResult + Send + Sync>;

/// A successful handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: Option<Value>,
}

impl Reply {
    /// A reply with a JSON body.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> HandlerResult {
        let body = serde_json::to_value(body)
            .map_err(|e| CoursewareError::internal_with_source("Failed to encode response", e))?;
        Ok(Self {
            status,
            location: None,
            body: Some(body),
        })
    }

    /// `200 OK` with a JSON body.
    pub fn ok<T: Serialize + ?Sized>(body: &T) -> HandlerResult {
        Self::json(StatusCode::OK, body)
    }

    /// `201 Created` with a `Location` header and no body.
    #[must_use]
    pub fn created(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            location: Some(location.into()),
            body: None,
        }
    }

    /// `204 No Content`.
    #[must_use]
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            location: None,
            body: None,
        }
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the `Location` value, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Converts the reply into an HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = match &self.body {
            Some(body) => Response::json(self.status, body),
            None => Response::empty(self.status),
        };
        if let Some(location) = &self.location {
            match HeaderValue::from_str(location) {
                Ok(value) => {
                    response.headers_mut().insert(LOCATION, value);
                }
                Err(error) => tracing::warn!(%error, location, "dropping invalid Location header"),
            }
        }
        response
    }
}

/// Parses a request body, treating an empty body as `{}`.
fn parse_body<Req: DeserializeOwned>(body: &[u8]) -> Result<Req, CoursewareError> {
    let body = if body.is_empty() { b"{}".as_slice() } else { body };
    serde_json::from_slice(body)
        .map_err(|e| CoursewareError::validation(vec![format!("Invalid request body: {e}")]))
}

/// Maps operation IDs to handlers.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, ErasedHandler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler that receives the JSON body as `Req`.
    pub fn register<Req, F, Fut>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        Req: DeserializeOwned + Send + 'static,
        F: Fn(RequestContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |ctx: RequestContext, body: Bytes| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let request: Req = parse_body(&body)?;
                handler(ctx, request).await
            })
        });

        self.handlers.insert(operation_id.into(), erased);
    }

    /// Registers a handler that ignores the body.
    pub fn register_no_body<F, Fut>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |ctx: RequestContext, _body: Bytes| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(ctx).await })
        });

        self.handlers.insert(operation_id.into(), erased);
    }

    /// Returns the handler for `operation_id`.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<ErasedHandler> {
        self.handlers.get(operation_id).cloned()
    }

    /// Returns `true` if `operation_id` has a handler.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Returns the number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterates over the registered operation IDs.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
