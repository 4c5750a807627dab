//! Stamps each request with an id and echoes it as `x-request-id`.
//!
//! An incoming id is only reused when the service sits behind a proxy that
//! assigns them (`security.trust_request_id`).

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use courseware_core::RequestId;
use http::HeaderValue;
use uuid::Uuid;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assigns request ids.
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    reuse_upstream: bool,
}

impl RequestIdMiddleware {
    /// Always mints a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses a well-formed incoming `x-request-id`, minting one otherwise.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self { reuse_upstream: true }
    }

    fn upstream_id(&self, request: &Request) -> Option<RequestId> {
        let raw = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
        Uuid::parse_str(raw).ok().map(RequestId::from_uuid)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let id = if self.reuse_upstream {
                self.upstream_id(&request).unwrap_or_default()
            } else {
                RequestId::new()
            };
            ctx.set_request_id(id);

            let mut response = next.run(ctx, request).await;
            if let Ok(value) = HeaderValue::try_from(id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;

    const UPSTREAM: &str = "01234567-89ab-7def-8123-456789abcdef";

    /// Runs `stage` over `GET /courses` and returns (context id, header).
    async fn run(stage: RequestIdMiddleware, incoming: Option<&str>) -> (String, String) {
        let mut builder = HttpRequest::builder().uri("/courses");
        if let Some(id) = incoming {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        let request = builder.body(Full::new(Bytes::new())).unwrap();

        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| Box::pin(async { Response::empty(StatusCode::OK) }));
        let response = stage.process(&mut ctx, request, next).await;

        let header = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        (ctx.request_id().to_string(), header)
    }

    #[tokio::test]
    async fn test_header_matches_context() {
        let (ctx_id, header) = run(RequestIdMiddleware::new(), None).await;
        assert_eq!(ctx_id, header);
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[tokio::test]
    async fn test_upstream_id_ignored_by_default() {
        let (_, header) = run(RequestIdMiddleware::new(), Some(UPSTREAM)).await;
        assert_ne!(header, UPSTREAM);
    }

    #[tokio::test]
    async fn test_upstream_id_reused_when_trusted() {
        let (ctx_id, header) = run(RequestIdMiddleware::trust_incoming(), Some(UPSTREAM)).await;
        assert_eq!(header, UPSTREAM);
        assert_eq!(ctx_id, UPSTREAM);
    }

    #[tokio::test]
    async fn test_malformed_upstream_id_replaced() {
        let (_, header) = run(RequestIdMiddleware::trust_incoming(), Some("req-42")).await;
        assert_ne!(header, "req-42");
        assert!(Uuid::parse_str(&header).is_ok());
    }
}
