//! HTTP server.
//!
//! Every request, matched or not, runs through the middleware [`Pipeline`].
//! The router resolves the operation ID and path parameters before the
//! pipeline starts, so per-operation stages can see them. The terminal
//! handler runs on its own Tokio task: a panic there becomes an internal
//! error instead of tearing down the connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use courseware_server::{Server, ServerConfig};
//!
//! let server = Server::builder()
//!     .config(ServerConfig::builder().http_addr("0.0.0.0:5000").build())
//!     .router(router)
//!     .handlers(registry)
//!     .pipeline(pipeline)
//!     .build();
//!
//! server.run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use courseware_core::{CoursewareError, RequestContext};
use courseware_middleware::stages::UnhandledError;
use courseware_middleware::{MiddlewareContext, Pipeline, Request, Response, ResponseExt};
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::handler::{HandlerRegistry, HandlerResult};
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Body of the 404 for requests no route matches.
pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Route Not Found";

/// Server startup errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// The Courseware HTTP server.
pub struct Server {
    config: ServerConfig,
    router: Router,
    handlers: HandlerRegistry,
    pipeline: Pipeline,
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the handler registry.
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Returns the middleware pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Accepts connections on `listener` until `shutdown` triggers, then
    /// waits up to the shutdown timeout for open connections to finish.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        if let Ok(local) = listener.local_addr() {
            tracing::info!(addr = %local, "server listening");
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(error) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(%remote_addr, %error, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(error) => tracing::error!(%error, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active_connections = tracker.active_connections(),
            timeout_secs = timeout.as_secs(),
            "draining connections"
        );
        if tokio::time::timeout(timeout, tracker.wait_for_shutdown())
            .await
            .is_err()
        {
            tracing::warn!(
                active_connections = tracker.active_connections(),
                "shutdown timeout reached"
            );
        }
        tracing::info!("server stopped");
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |req: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(%remote_addr, "closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(self: &Arc<Self>, req: http::Request<Incoming>) -> Response {
        let timeout = self.config.request_timeout();
        let limit = self.config.max_body_bytes();

        let (parts, body) = req.into_parts();
        let collected = tokio::time::timeout(timeout, Limited::new(body, limit).collect()).await;
        let bytes = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(error)) if error.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::warn!(path = %parts.uri.path(), limit, "request body too large");
                return Response::json_message(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Ok(Err(error)) => {
                tracing::warn!(path = %parts.uri.path(), %error, "failed to read request body");
                return Response::json_message(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
            Err(_) => {
                tracing::warn!(path = %parts.uri.path(), "timed out reading request body");
                return Response::json_message(StatusCode::REQUEST_TIMEOUT, "Request timed out");
            }
        };

        let request = Request::from_parts(parts, Full::new(bytes));
        match tokio::time::timeout(timeout, self.dispatch(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!("request timed out");
                Response::json_message(StatusCode::GATEWAY_TIMEOUT, "Request timed out")
            }
        }
    }

    /// Runs one request through routing, the pipeline and the handler.
    ///
    /// This is the whole request path minus socket I/O, used directly by
    /// the in-process test client.
    pub async fn dispatch(self: &Arc<Self>, request: Request) -> Response {
        let mut ctx = MiddlewareContext::new();
        if let Some(matched) = self.router.match_route(request.method(), request.uri().path()) {
            let (operation_id, params) = matched.into_parts();
            ctx.set_operation_id(operation_id);
            ctx.set_path_params(params);
        }

        let server = Arc::clone(self);
        self.pipeline
            .process(ctx, request, move |ctx, request| {
                let request_ctx = ctx.to_request_context();
                Box::pin(async move { server.invoke(request_ctx, request).await })
            })
            .await
    }

    async fn invoke(&self, ctx: RequestContext, request: Request) -> Response {
        let Some(operation_id) = ctx.operation_id().map(str::to_owned) else {
            return Response::json_message(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND_MESSAGE);
        };
        let Some(handler) = self.handlers.get(&operation_id) else {
            return UnhandledError::into_response(
                CoursewareError::internal(format!("No handler registered for {operation_id}"))
                    .with_status(StatusCode::NOT_IMPLEMENTED),
            );
        };

        let body: Bytes = match request.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let task = tokio::spawn(handler(ctx, body));
        match task.await {
            Ok(result) => into_response(result),
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    "Handler panicked"
                } else {
                    "Handler was cancelled"
                };
                UnhandledError::into_response(CoursewareError::internal_with_source(message, join_error))
            }
        }
    }
}

/// Renders a handler result. Internal errors are left for the error handler.
fn into_response(result: HandlerResult) -> Response {
    match result {
        Ok(reply) => reply.into_response(),
        Err(error) if error.is_unhandled() => UnhandledError::into_response(error),
        Err(error) => Response::json(error.status_code(), &error.to_body()),
    }
}

/// Builder for [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<ServerConfig>,
    router: Option<Router>,
    handlers: Option<HandlerRegistry>,
    pipeline: Option<Pipeline>,
}

impl ServerBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the router.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Sets the handlers.
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Sets the middleware pipeline. Defaults to an empty one.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config.unwrap_or_default(),
            router: self.router.unwrap_or_default(),
            handlers: self.handlers.unwrap_or_default(),
            pipeline: self.pipeline.unwrap_or_else(|| Pipeline::builder().build()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Reply;
    use courseware_middleware::stages::ErrorHandlerMiddleware;
    use http::Method;
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn request(method: &str, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn server() -> Arc<Server> {
        let router = Router::new()
            .with_route(Method::GET, "/courses/{id}", "getCourse")
            .with_route(Method::GET, "/boom", "boom")
            .with_route(Method::GET, "/missing", "notRegistered")
            .with_route(Method::GET, "/forbidden", "forbidden");

        let mut handlers = HandlerRegistry::new();
        handlers.register_no_body("getCourse", |ctx: RequestContext| async move {
            Reply::ok(&serde_json::json!({ "id": ctx.path_param("id") }))
        });
        handlers.register_no_body("boom", |_ctx: RequestContext| async move {
            let replies: Vec<Reply> = Vec::new();
            Ok(replies[0].clone())
        });
        handlers.register_no_body("forbidden", |_ctx: RequestContext| async move {
            Err(CoursewareError::authorization("Not Authorized"))
        });

        Arc::new(
            Server::builder()
                .router(router)
                .handlers(handlers)
                .pipeline(
                    Pipeline::builder()
                        .stage(ErrorHandlerMiddleware::new(false))
                        .build(),
                )
                .build(),
        )
    }

    #[tokio::test]
    async fn test_dispatch_passes_path_params() {
        let response = server().dispatch(request("GET", "/courses/12")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], "12");
    }

    #[tokio::test]
    async fn test_unmatched_route() {
        let response = server().dispatch(request("GET", "/instructors")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], ROUTE_NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let response = server().dispatch(request("GET", "/boom")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Handler panicked");
        assert_eq!(body["error"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_missing_handler() {
        let response = server().dispatch(request("GET", "/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_client_errors_are_rendered_directly() {
        let response = server().dispatch(request("GET", "/forbidden")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["message"], "Not Authorized");
    }

    #[tokio::test]
    async fn test_serves_over_tcp_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();

        let server = Server::builder()
            .router(Router::new().with_route(Method::GET, "/courses/{id}", "getCourse"))
            .build();
        let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /nowhere HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 404"));
        assert!(raw.contains(ROUTE_NOT_FOUND_MESSAGE));

        shutdown.trigger();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
