//! # Courseware Auth
//!
//! The pieces the authentication stage is built from, leaves first:
//!
//! - [`BasicCredentials`] - parses an `Authorization: Basic ...` header
//! - [`SecretHasher`] - argon2 hashing and verification on the blocking pool
//! - [`IdentityResolver`] - exact-match user lookup by email address
//! - [`Authenticator`] - runs the three together and reports an [`AuthFailure`]
//! - [`authorize_owner`] - the ownership check used by course mutations

#![doc(html_root_url = "https://docs.rs/courseware-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod credentials;
mod ownership;
mod resolver;
mod secret;

pub use credentials::BasicCredentials;
pub use ownership::{authorize_owner, OwnershipDecision, NOT_AUTHORIZED_MESSAGE};
pub use resolver::{AuthFailure, Authenticator, IdentityResolver};
pub use secret::{HashParams, SecretError, SecretHasher};
