//! Mutable per-request state shared by the pipeline stages.
//!
//! Routing, the request id stage and the authentication stage each write a
//! piece of it. The handler never sees this type; it gets the frozen
//! [`RequestContext`](courseware_core::RequestContext) built by
//! [`MiddlewareContext::to_request_context`].

use courseware_core::{CallerIdentity, RequestContext, RequestId};
use http::Extensions;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-request state as it moves through the stages.
///
/// ```
/// use courseware_middleware::context::MiddlewareContext;
/// use courseware_core::{AuthenticatedUser, CallerIdentity, UserId};
///
/// let mut ctx = MiddlewareContext::new();
/// assert!(ctx.identity().user().is_none());
///
/// ctx.set_identity(CallerIdentity::User(AuthenticatedUser {
///     id: UserId::new(1),
///     email_address: "joe@smith.com".to_string(),
///     first_name: "Joe".to_string(),
///     last_name: "Smith".to_string(),
/// }));
/// assert_eq!(ctx.identity().user().map(|u| u.id), Some(UserId::new(1)));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    identity: CallerIdentity,
    operation_id: Option<String>,
    path_params: HashMap<String, String>,
    received_at: Instant,
    extensions: Extensions,
}

impl MiddlewareContext {
    /// An anonymous, unrouted context with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            identity: CallerIdentity::Anonymous,
            operation_id: None,
            path_params: HashMap::new(),
            received_at: Instant::now(),
            extensions: Extensions::new(),
        }
    }

    /// Current request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the generated id with a trusted incoming one.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Who is calling. Anonymous until authentication succeeds.
    #[must_use]
    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// Records the authenticated caller.
    pub fn set_identity(&mut self, identity: CallerIdentity) {
        self.identity = identity;
    }

    /// Operation matched by the router. `None` for unmatched requests.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Records the matched operation.
    pub fn set_operation_id(&mut self, operation_id: impl Into<String>) {
        self.operation_id = Some(operation_id.into());
    }

    /// Records the `{name}` captures from the matched route.
    pub fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.received_at.elapsed()
    }

    /// Attaches a value for later stages, replacing any of the same type.
    pub fn set_extension<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(value);
    }

    /// Borrows an attached value.
    #[must_use]
    pub fn get_extension<T: Clone + Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get()
    }

    /// Detaches a value.
    pub fn remove_extension<T: Clone + Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions.remove()
    }

    /// Freezes the state for the handler.
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        let mut ctx = RequestContext::with_request_id(self.request_id)
            .with_identity(self.identity.clone());
        if let Some(operation_id) = &self.operation_id {
            ctx = ctx.with_operation_id(operation_id.clone());
        }
        ctx.set_path_params(self.path_params.clone());
        ctx
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseware_core::{AuthenticatedUser, UserId};

    fn joe() -> CallerIdentity {
        CallerIdentity::User(AuthenticatedUser {
            id: UserId::new(1),
            email_address: "joe@smith.com".to_string(),
            first_name: "Joe".to_string(),
            last_name: "Smith".to_string(),
        })
    }

    #[test]
    fn test_starts_anonymous_and_unrouted() {
        let ctx = MiddlewareContext::new();
        assert!(matches!(ctx.identity(), CallerIdentity::Anonymous));
        assert!(ctx.operation_id().is_none());
    }

    #[test]
    fn test_extension_is_replaced_by_type() {
        #[derive(Debug, Clone, PartialEq)]
        struct BodyBytes(usize);

        let mut ctx = MiddlewareContext::new();
        ctx.set_extension(BodyBytes(10));
        ctx.set_extension(BodyBytes(42));
        assert_eq!(ctx.get_extension::<BodyBytes>(), Some(&BodyBytes(42)));

        assert_eq!(ctx.remove_extension::<BodyBytes>(), Some(BodyBytes(42)));
        assert!(ctx.get_extension::<BodyBytes>().is_none());
    }

    #[test]
    fn test_frozen_view_keeps_route_and_caller() {
        let mut ctx = MiddlewareContext::new();
        ctx.set_identity(joe());
        ctx.set_operation_id("updateCourse");
        ctx.set_path_params(HashMap::from([("id".to_string(), "4".to_string())]));

        let frozen = ctx.to_request_context();
        assert_eq!(frozen.request_id(), ctx.request_id());
        assert_eq!(frozen.operation_id(), Some("updateCourse"));
        assert_eq!(frozen.path_param("id"), Some("4"));
        assert_eq!(frozen.authenticated().unwrap().email_address, "joe@smith.com");
    }
}
