//! # Courseware Core
//!
//! Core types shared by every Courseware crate.
//!
//! - [`RequestContext`] - Per-request context handed to handlers
//! - [`RequestId`] - UUID v7 request identifier
//! - [`CallerIdentity`] / [`AuthenticatedUser`] - The request-scoped identity
//! - [`User`] / [`Course`] - Stored records and their write models
//! - [`CoursewareError`] - Error taxonomy with HTTP status mapping

#![doc(html_root_url = "https://docs.rs/courseware-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod identity;
pub mod model;

pub use context::{RequestContext, RequestId};
pub use error::{ErrorCategory, CoursewareError, CoursewareResult, ACCESS_DENIED_MESSAGE};
pub use identity::{AuthenticatedUser, CallerIdentity, Owned, UserId};
pub use model::{Course, CourseChanges, CourseId, CourseView, NewCourse, NewUser, User, UserSummary};
