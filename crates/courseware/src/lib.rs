//! # Courseware
//!
//! A users and courses HTTP service. Callers authenticate with HTTP Basic
//! credentials checked against argon2 password hashes; courses can only be
//! changed or deleted by the user that created them.
//!
//! ## Routes
//!
//! | Method | Path            | Operation      | Auth | Success                      |
//! |--------|-----------------|----------------|------|------------------------------|
//! | GET    | `/users`        | `getUser`      | yes  | 200 `{name, email}`          |
//! | POST   | `/users`        | `createUser`   | no   | 201, `Location: /`           |
//! | GET    | `/courses`      | `listCourses`  | no   | 200, courses with owners     |
//! | GET    | `/courses/{id}` | `getCourse`    | no   | 200, one course              |
//! | POST   | `/courses`      | `createCourse` | yes  | 201, `Location: /courses/id` |
//! | PUT    | `/courses/{id}` | `updateCourse` | yes  | 204                          |
//! | DELETE | `/courses/{id}` | `deleteCourse` | yes  | 204                          |
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → Telemetry → ErrorHandler → Authentication → Validation → Handler
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use courseware::{build_server, config::CoursewareConfig, store::InMemoryStore};
//!
//! let config = CoursewareConfig::default();
//! let server = build_server(&config, Arc::new(InMemoryStore::new()))?;
//! server.run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/courseware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod routes;
pub mod seed;

pub use app::{build_server, build_server_with_state, AppState};
pub use seed::{SeedData, SeedError, SeedSummary};

// Re-export the member crates
pub use courseware_auth as auth;
pub use courseware_config as config;
pub use courseware_core as core;
pub use courseware_middleware as middleware;
pub use courseware_server as server;
pub use courseware_store as store;
pub use courseware_telemetry as telemetry;
