//! The stage contract.
//!
//! A stage sees the request before anything behind it does. It may answer
//! on the spot (a 401 for missing credentials, a 400 for a bad body) or hand
//! the request on through [`Next`] and inspect what comes back.
//!
//! ```ignore
//! struct MaintenanceMode;
//!
//! impl Middleware for MaintenanceMode {
//!     fn name(&self) -> &'static str {
//!         "maintenance"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             if request.method() == http::Method::GET {
//!                 return next.run(ctx, request).await;
//!             }
//!             Response::json_message(StatusCode::SERVICE_UNAVAILABLE, "Read only")
//!         })
//!     }
//! }
//! ```

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// Heap-allocated, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One stage of the request pipeline.
///
/// `next` is consumed by running it, so a stage reaches the handler at most
/// once. A stage that answers itself must return a finished response.
pub trait Middleware: Send + Sync + 'static {
    /// Stage name, as reported by [`Pipeline::stage_names`](crate::Pipeline::stage_names).
    fn name(&self) -> &'static str;

    /// Handles the request or forwards it.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The handler at the end of a chain.
pub type Terminal<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// Whatever sits behind the current stage: more stages, then the handler.
pub enum Next<'a> {
    /// Another stage, followed by the rest of the chain.
    Stage(&'a dyn Middleware, Box<Next<'a>>),
    /// The end of the chain.
    Handler(Terminal<'a>),
}

impl<'a> Next<'a> {
    /// Puts `stage` in front of `rest`.
    pub(crate) fn stage(stage: &'a dyn Middleware, rest: Next<'a>) -> Self {
        Self::Stage(stage, Box::new(rest))
    }

    /// Ends the chain with `f`.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self::Handler(Box::new(f))
    }

    /// Forwards the request.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self {
            Self::Stage(stage, rest) => stage.process(ctx, request, *rest).await,
            Self::Handler(handler) => handler(ctx, request).await,
        }
    }
}
