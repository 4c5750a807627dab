//! What a handler knows about its request besides the body.

use crate::error::CoursewareError;
use crate::identity::{AuthenticatedUser, CallerIdentity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Correlation id echoed in `x-request-id` and attached to every log line.
///
/// Fresh ids are UUID v7, so they sort by arrival time.
///
/// ```
/// use courseware_core::RequestId;
///
/// assert_ne!(RequestId::new(), RequestId::new());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// A new time-ordered id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an id received from upstream.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Read-only request state handed to a route handler.
///
/// ```
/// use courseware_core::RequestContext;
///
/// let ctx = RequestContext::new().with_path_param("id", "3");
/// assert_eq!(ctx.path_param("id"), Some("3"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request_id: RequestId,
    identity: CallerIdentity,
    operation_id: Option<String>,
    path_params: HashMap<String, String>,
}

impl RequestContext {
    /// Anonymous, unrouted, with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Anonymous and unrouted, carrying `request_id`.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            ..Self::default()
        }
    }

    /// Correlation id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The caller, anonymous on public routes.
    #[must_use]
    pub const fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// Sets the caller.
    #[must_use]
    pub fn with_identity(mut self, identity: CallerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// The authenticated caller.
    ///
    /// Protected operations only reach their handler after authentication
    /// succeeded, so an anonymous caller here is a wiring fault and comes
    /// back as an internal error.
    pub fn authenticated(&self) -> Result<&AuthenticatedUser, CoursewareError> {
        self.identity.user().ok_or_else(|| {
            CoursewareError::internal("protected operation reached without an authenticated user")
        })
    }

    /// Matched operation.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Sets the matched operation.
    #[must_use]
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// A `{name}` capture from the route template.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Replaces every capture.
    pub fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }

    /// Adds one capture.
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::identity::UserId;

    #[test]
    fn test_request_id_is_hyphenated_uuid() {
        let text = RequestId::new().to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.matches('-').count(), 4);
    }

    #[test]
    fn test_request_id_keeps_upstream_value() {
        let upstream = Uuid::now_v7();
        assert_eq!(RequestId::from_uuid(upstream).to_string(), upstream.to_string());
    }

    #[test]
    fn test_routed_context() {
        let ctx = RequestContext::new()
            .with_operation_id("getCourse")
            .with_path_param("id", "12");

        assert!(matches!(ctx.identity(), CallerIdentity::Anonymous));
        assert_eq!(ctx.operation_id(), Some("getCourse"));
        assert_eq!(ctx.path_param("id"), Some("12"));
        assert!(ctx.path_param("slug").is_none());
    }

    #[test]
    fn test_authenticated_requires_user() {
        let ctx = RequestContext::new();
        let err = ctx.authenticated().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Internal);

        let user = AuthenticatedUser {
            id: UserId::new(3),
            email_address: "sam@example.com".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Jones".to_string(),
        };
        let ctx = ctx.with_identity(CallerIdentity::User(user));
        assert_eq!(ctx.authenticated().unwrap().id, UserId::new(3));
    }
}
