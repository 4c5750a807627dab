//! Global error handler.
//!
//! Handlers and stages never render internal failures themselves. They return
//! a response carrying an [`UnhandledError`] extension, and this stage turns
//! it into the client body `{"message": ..., "error": {}}` with the error's
//! status. The full error chain is logged only when `log_errors` is enabled.

use crate::{
    context::MiddlewareContext,
    middleware::{BoxFuture, Middleware, Next},
    types::{Request, Response, ResponseExt},
};
use courseware_core::CoursewareError;
use std::error::Error as _;
use std::sync::Arc;

/// An error waiting to be rendered by [`ErrorHandlerMiddleware`].
#[derive(Debug, Clone)]
pub struct UnhandledError(pub Arc<CoursewareError>);

impl UnhandledError {
    /// Builds a placeholder response that carries `error`.
    ///
    /// The status is already set so the response is still meaningful if no
    /// error handler is installed.
    #[must_use]
    pub fn into_response(error: CoursewareError) -> Response {
        let mut response = Response::empty(error.status_code());
        response.extensions_mut().insert(Self(Arc::new(error)));
        response
    }

    /// Returns the error and its sources, outermost first.
    #[must_use]
    pub fn chain(&self) -> Vec<String> {
        let mut chain = vec![self.0.to_string()];
        let mut source = self.0.source();
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }
}

/// Renders [`UnhandledError`]s.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandlerMiddleware {
    log_errors: bool,
}

impl ErrorHandlerMiddleware {
    /// Creates the stage. With `log_errors` set, every rendered error is
    /// logged at `ERROR` with its full source chain.
    #[must_use]
    pub fn new(log_errors: bool) -> Self {
        Self { log_errors }
    }

    fn render(&self, ctx: &MiddlewareContext, unhandled: &UnhandledError, response: &Response) -> Response {
        let error = &unhandled.0;
        if self.log_errors {
            tracing::error!(
                request_id = %ctx.request_id(),
                operation_id = ctx.operation_id().unwrap_or("unmatched"),
                error.chain = ?unhandled.chain(),
                "unhandled error"
            );
        }

        let mut rendered = Response::json(error.status_code(), &error.to_body());
        for (name, value) in response.headers() {
            if name != http::header::CONTENT_TYPE && name != http::header::CONTENT_LENGTH {
                rendered.headers_mut().append(name.clone(), value.clone());
            }
        }
        rendered
    }
}

impl Middleware for ErrorHandlerMiddleware {
    fn name(&self) -> &'static str {
        "error_handler"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            match response.extensions_mut().remove::<UnhandledError>() {
                Some(unhandled) => self.render(ctx, &unhandled, &response),
                None => response,
            }
        })
    }
}
