//! # Courseware Middleware
//!
//! The request pipeline every Courseware request flows through.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → RequestId → Telemetry → ErrorHandler → Authentication → Validation → Handler
//!                                                                                  ↓
//! Response ←─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Stage | Middleware     | Purpose                                         |
//! |-------|----------------|-------------------------------------------------|
//! | 1     | Request ID     | Assign a UUID v7 and echo it in `x-request-id`  |
//! | 2     | Telemetry      | One structured log event per request            |
//! | 3     | Error handler  | Render unhandled errors as `{message, error}`   |
//! | 4     | Authentication | Basic credentials for protected operations      |
//! | 5     | Validation     | Collect-all field rules per operation           |
//!
//! Ownership checks need the stored course, so they run inside the course
//! handlers after the course has been loaded.
//!
//! ## Example
//!
//! ```
//! use courseware_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 5);
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[2].name(), "error_handler");
//! ```

#![doc(html_root_url = "https://docs.rs/courseware-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use types::{Request, Response, ResponseExt};
