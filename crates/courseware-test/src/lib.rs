//! # Courseware Test
//!
//! In-memory HTTP testing for Courseware servers. Requests go through the
//! router, the full middleware pipeline and the handlers without a socket.
//!
//! ```ignore
//! use courseware_test::TestClient;
//! use serde_json::json;
//!
//! let client = TestClient::new(server);
//!
//! client
//!     .post("/courses")
//!     .basic_auth("joe@smith.com", "joepassword")
//!     .json(&json!({"title": "Rust", "description": "Ownership"}))
//!     .send()
//!     .await
//!     .assert_status(StatusCode::CREATED);
//! ```

#![doc(html_root_url = "https://docs.rs/courseware-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
