//! # Courseware Server
//!
//! HTTP/1.1 server for Courseware, built on Hyper and Tokio:
//!
//! - Method and path routing to operation IDs
//! - Operation-keyed handler registry
//! - The middleware pipeline around every request, including unmatched ones
//! - Body size and time limits
//! - Graceful shutdown
//!
//! [`Server::dispatch`] runs a request through everything except the socket,
//! which is what the in-process test client uses.

#![doc(html_root_url = "https://docs.rs/courseware-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod handler;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use handler::{HandlerRegistry, HandlerResult, Reply};
pub use router::{RouteMatch, Router};
pub use server::{Server, ServerBuilder, ServerError, ROUTE_NOT_FOUND_MESSAGE};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
