//! Request telemetry middleware.
//!
//! Emits one structured `tracing` event when a request completes. The event
//! level follows the status: server errors log at `ERROR`, client errors at
//! `WARN` and everything else at `INFO`.
//!
//! # Fields
//!
//! - `request_id` - Unique request identifier
//! - `operation_id` - Matched operation, or `unmatched`
//! - `http.method` / `http.path` - Request line
//! - `http.status_code` - Response status
//! - `duration_ms` - Time spent in the pipeline
//! - `caller` - `user:<id>` or `anonymous`

use crate::{
    context::MiddlewareContext,
    middleware::{BoxFuture, Middleware, Next},
    types::{Request, Response},
};
use std::time::Instant;

/// Telemetry collected for one request.
///
/// Stored in the context after the response is produced so tests and later
/// stages can inspect it.
#[derive(Debug, Clone)]
pub struct RequestTelemetry {
    /// The service name.
    pub service_name: String,
    /// The operation ID.
    pub operation_id: String,
    /// The HTTP method.
    pub method: String,
    /// The request path.
    pub path: String,
    /// The HTTP status code.
    pub status_code: u16,
    /// Request duration in milliseconds.
    pub duration_ms: f64,
    /// The request ID.
    pub request_id: String,
    /// The caller, as logged.
    pub caller: String,
}

/// Telemetry middleware that logs every completed request.
#[derive(Debug, Clone)]
pub struct TelemetryMiddleware {
    service_name: String,
}

impl TelemetryMiddleware {
    /// Creates a new telemetry middleware with the given service name.
    #[must_use]
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
        }
    }

    fn emit(data: &RequestTelemetry) {
        let status = data.status_code;
        macro_rules! completed {
            ($level:ident) => {
                tracing::$level!(
                    service = %data.service_name,
                    request_id = %data.request_id,
                    operation_id = %data.operation_id,
                    http.method = %data.method,
                    http.path = %data.path,
                    http.status_code = status,
                    duration_ms = data.duration_ms,
                    caller = %data.caller,
                    "request completed"
                )
            };
        }

        if status >= 500 {
            completed!(error);
        } else if status >= 400 {
            completed!(warn);
        } else {
            completed!(info);
        }
    }
}

impl Middleware for TelemetryMiddleware {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().to_string();
            let path = request.uri().path().to_string();

            let response = next.run(ctx, request).await;

            let data = RequestTelemetry {
                service_name: self.service_name.clone(),
                operation_id: ctx.operation_id().unwrap_or("unmatched").to_string(),
                method,
                path,
                status_code: response.status().as_u16(),
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                request_id: ctx.request_id().to_string(),
                caller: ctx.identity().log_id(),
            };
            Self::emit(&data);
            ctx.set_extension(data);

            response
        })
    }
}
