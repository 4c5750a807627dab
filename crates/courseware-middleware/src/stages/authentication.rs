//! Authentication middleware.
//!
//! Gates protected operations behind HTTP Basic credentials. For an operation
//! in the protected set the stage either attaches the authenticated user to
//! the context and continues, or answers 401 `{"message": "Access Denied"}`.
//! The reason for a rejection is logged at `WARN` and never sent to the
//! client. Requests for public operations pass through untouched.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::error_handler::UnhandledError;
use crate::types::{Request, Response, ResponseExt};
use courseware_auth::Authenticator;
use courseware_core::{CallerIdentity, CoursewareError, ACCESS_DENIED_MESSAGE};
use http::header::AUTHORIZATION;
use http::StatusCode;
use std::collections::HashSet;

/// Middleware that authenticates requests for protected operations.
#[derive(Debug, Clone)]
pub struct AuthenticationMiddleware {
    authenticator: Authenticator,
    protected: HashSet<String>,
}

impl AuthenticationMiddleware {
    /// Creates the stage with no protected operations.
    #[must_use]
    pub fn new(authenticator: Authenticator) -> Self {
        Self {
            authenticator,
            protected: HashSet::new(),
        }
    }

    /// Requires authentication for `operation_id`.
    #[must_use]
    pub fn protect(mut self, operation_id: impl Into<String>) -> Self {
        self.protected.insert(operation_id.into());
        self
    }

    /// Returns `true` if the operation requires authentication.
    #[must_use]
    pub fn is_protected(&self, operation_id: Option<&str>) -> bool {
        operation_id.is_some_and(|op| self.protected.contains(op))
    }
}

impl Middleware for AuthenticationMiddleware {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if !self.is_protected(ctx.operation_id()) {
                return next.run(ctx, request).await;
            }

            let header = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok());

            let outcome = self.authenticator.authenticate(header).await;
            match outcome {
                Ok(user) => {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        user_id = %user.id,
                        "request authenticated"
                    );
                    ctx.set_identity(CallerIdentity::User(user));
                    next.run(ctx, request).await
                }
                Err(failure) if failure.is_rejection() => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        operation_id = ctx.operation_id().unwrap_or_default(),
                        reason = %failure,
                        "authentication rejected"
                    );
                    Response::json_message(StatusCode::UNAUTHORIZED, ACCESS_DENIED_MESSAGE)
                }
                Err(failure) => UnhandledError::into_response(CoursewareError::from(failure)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseware_auth::{BasicCredentials, HashParams, IdentityResolver, SecretHasher};
    use courseware_core::{NewUser, UserId};
    use courseware_store::{InMemoryStore, UserStore};
    use bytes::Bytes;
    use http::Request as HttpRequest;
    use http_body_util::{BodyExt, Full};
    use std::sync::Arc;

    /// Identity seen by the handler, recorded for assertions.
    #[derive(Debug, Clone)]
    struct Seen(Option<UserId>);

    async fn middleware() -> AuthenticationMiddleware {
        let hasher = SecretHasher::new(HashParams::minimal()).unwrap();
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_user(NewUser {
                first_name: "Sally".to_string(),
                last_name: "Jones".to_string(),
                email_address: "sally@jones.com".to_string(),
                password_hash: hasher.hash_blocking("sallypassword").unwrap(),
            })
            .await
            .unwrap();

        AuthenticationMiddleware::new(Authenticator::new(IdentityResolver::new(store), hasher))
            .protect("createCourse")
    }

    fn request(auth: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().method("POST").uri("/courses");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn credentials(name: &str, secret: &str) -> String {
        BasicCredentials {
            name: name.to_string(),
            secret: secret.to_string(),
        }
        .to_header_value()
    }

    async fn run(mw: &AuthenticationMiddleware, operation: &str, req: Request) -> (MiddlewareContext, Response) {
        let mut ctx = MiddlewareContext::new();
        ctx.set_operation_id(operation);
        let next = Next::handler(|ctx, _req| {
            let seen = Seen(ctx.identity().user().map(|u| u.id));
            ctx.set_extension(seen);
            Box::pin(async { Response::empty(StatusCode::CREATED) })
        });
        let response = mw.process(&mut ctx, req, next).await;
        (ctx, response)
    }

    async fn body(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_credentials_attach_identity() {
        let mw = middleware().await;
        let (ctx, response) = run(
            &mw,
            "createCourse",
            request(Some(&credentials("sally@jones.com", "sallypassword"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(ctx.get_extension::<Seen>().unwrap().0, Some(UserId::new(1)));
    }

    #[tokio::test]
    async fn test_missing_header_is_denied() {
        let mw = middleware().await;
        let (ctx, response) = run(&mw, "createCourse", request(None)).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(response).await, r#"{"message":"Access Denied"}"#);
        assert!(ctx.get_extension::<Seen>().is_none());
    }

    #[tokio::test]
    async fn test_rejections_share_one_body() {
        let mw = middleware().await;
        let unknown = run(
            &mw,
            "createCourse",
            request(Some(&credentials("nobody@jones.com", "sallypassword"))),
        )
        .await
        .1;
        let wrong = run(
            &mw,
            "createCourse",
            request(Some(&credentials("sally@jones.com", "wrong"))),
        )
        .await
        .1;

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(unknown).await, body(wrong).await);
    }

    #[tokio::test]
    async fn test_public_operation_passes_through() {
        let mw = middleware().await;
        let (ctx, response) = run(&mw, "listCourses", request(None)).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(ctx.get_extension::<Seen>().unwrap().0, None);
    }

    #[test]
    fn test_unmatched_requests_are_not_protected() {
        let hasher = SecretHasher::default();
        let mw = AuthenticationMiddleware::new(Authenticator::new(
            IdentityResolver::new(Arc::new(InMemoryStore::new())),
            hasher,
        ))
        .protect("deleteCourse");

        assert!(mw.is_protected(Some("deleteCourse")));
        assert!(!mw.is_protected(Some("getCourse")));
        assert!(!mw.is_protected(None));
    }
}
