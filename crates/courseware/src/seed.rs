//! Initial data loading.
//!
//! A seed file is JSON:
//!
//! ```json
//! {
//!   "users": [
//!     { "firstName": "Joe", "lastName": "Smith",
//!       "emailAddress": "joe@smith.com", "password": "joepassword" }
//!   ],
//!   "courses": [
//!     { "userId": 1, "title": "Build a Basic Bookcase",
//!       "description": "...", "estimatedTime": "12 hours" }
//!   ]
//! }
//! ```
//!
//! Passwords are hashed as they are loaded. Users are inserted in file order,
//! so into an empty store the first user gets id 1.

use std::path::{Path, PathBuf};

use courseware_auth::{SecretError, SecretHasher};
use courseware_core::{NewCourse, NewUser, UserId};
use courseware_store::{CourseStore, StoreError, UserStore};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The file could not be read.
    #[error("failed to read seed file {path}")]
    Read {
        /// Seed file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid seed JSON.
    #[error("invalid seed data: {0}")]
    Parse(#[from] serde_json::Error),

    /// A password could not be hashed.
    #[error("failed to hash seed password: {0}")]
    Hash(#[from] SecretError),

    /// The store rejected a record.
    #[error("failed to store seed record: {0}")]
    Store(#[from] StoreError),
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedData {
    /// Users, in insertion order.
    #[serde(default)]
    pub users: Vec<SeedUser>,
    /// Courses, referencing users by id.
    #[serde(default)]
    pub courses: Vec<SeedCourse>,
}

/// A seed user with a plaintext password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login name.
    pub email_address: String,
    /// Plaintext password.
    pub password: String,
}

/// A seed course.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCourse {
    /// Owner id.
    pub user_id: u64,
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: String,
    /// Free-form time estimate.
    #[serde(default)]
    pub estimated_time: Option<String>,
    /// Free-form list of materials.
    #[serde(default)]
    pub materials_needed: Option<String>,
}

/// Counts of inserted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Users inserted.
    pub users: usize,
    /// Courses inserted.
    pub courses: usize,
}

impl SeedData {
    /// Parses seed JSON.
    pub fn from_json(content: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads and parses a seed file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SeedError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&content)
    }

    /// Inserts users then courses. Stops at the first failure.
    pub async fn apply<S>(self, store: &S, hasher: &SecretHasher) -> Result<SeedSummary, SeedError>
    where
        S: UserStore + CourseStore,
    {
        let mut summary = SeedSummary {
            users: 0,
            courses: 0,
        };

        for user in self.users {
            let password_hash = hasher.hash(user.password).await?;
            store
                .insert_user(NewUser {
                    first_name: user.first_name,
                    last_name: user.last_name,
                    email_address: user.email_address,
                    password_hash,
                })
                .await?;
            summary.users += 1;
        }

        for course in self.courses {
            store
                .insert_course(NewCourse {
                    title: course.title,
                    description: course.description,
                    estimated_time: course.estimated_time,
                    materials_needed: course.materials_needed,
                    owner_id: UserId::new(course.user_id),
                })
                .await?;
            summary.courses += 1;
        }

        info!(users = summary.users, courses = summary.courses, "seed data loaded");
        Ok(summary)
    }
}
