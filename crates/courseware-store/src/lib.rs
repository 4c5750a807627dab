//! # Courseware Store
//!
//! The record store behind the Courseware service.
//!
//! Handlers and the authentication stage only see the [`UserStore`] and
//! [`CourseStore`] traits. [`InMemoryStore`] implements both and enforces the
//! two constraints the service relies on: email addresses are unique and
//! every course references an existing user.
//!
//! # Example
//!
//! ```
//! use courseware_core::NewUser;
//! use courseware_store::{InMemoryStore, UserStore};
//!
//! # tokio_test_block_on(async {
//! let store = InMemoryStore::new();
//! let user = store
//!     .insert_user(NewUser {
//!         first_name: "Joe".into(),
//!         last_name: "Smith".into(),
//!         email_address: "joe@smith.com".into(),
//!         password_hash: "$argon2id$...".into(),
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(user.id.get(), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/courseware-store/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use store::{CourseStore, StoreFuture, UserStore};
