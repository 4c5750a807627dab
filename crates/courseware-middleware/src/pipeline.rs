//! Ordered stage list.
//!
//! The first stage added sees the request first and the response last.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A request pipeline, built once and shared by every connection.
///
/// ```ignore
/// let pipeline = Pipeline::builder()
///     .stage(RequestIdMiddleware::new())
///     .stage(ErrorHandlerMiddleware::new(false))
///     .build();
///
/// let response = pipeline.process(ctx, request, handler).await;
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Middleware>]>,
}

impl Pipeline {
    /// Starts an empty pipeline.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Runs `request` through every stage, then `handler`.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let chain = self
            .stages
            .iter()
            .rev()
            .fold(Next::handler(handler), |rest, stage| Next::stage(stage.as_ref(), rest));
        chain.run(&mut ctx, request).await
    }

    /// Stage names, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Collects stages for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Middleware>>,
}

impl PipelineBuilder {
    /// Appends a stage inside the ones already added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Freezes the stage list.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages.into(),
        }
    }
}

/// The stages of the standard Courseware pipeline, in execution order.
///
/// The error handler sits outside authentication and validation so that an
/// unhandled error raised by either of them, or by the handler, is rendered
/// in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Assigns the request id.
    RequestId,
    /// Logs each completed request.
    Telemetry,
    /// Renders unhandled errors.
    ErrorHandler,
    /// Checks credentials for protected operations.
    Authentication,
    /// Applies body rules.
    Validation,
}

impl Stage {
    /// Matches the stage's [`Middleware::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::Telemetry => "telemetry",
            Self::ErrorHandler => "error_handler",
            Self::Authentication => "authentication",
            Self::Validation => "validation",
        }
    }

    /// Every stage, outermost first.
    #[must_use]
    pub const fn all() -> [Stage; 5] {
        [
            Self::RequestId,
            Self::Telemetry,
            Self::ErrorHandler,
            Self::Authentication,
            Self::Validation,
        ]
    }
}
