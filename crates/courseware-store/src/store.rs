//! Store traits.
//!
//! Both traits return boxed futures so they can be used as trait objects
//! (`Arc<dyn UserStore>`) by the server and the authentication stage.

use courseware_core::{Course, CourseChanges, CourseId, NewCourse, NewUser, User, UserId};
use std::future::Future;
use std::pin::Pin;

use crate::error::StoreResult;

/// A boxed, sendable future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Lookup and creation of users.
pub trait UserStore: Send + Sync + 'static {
    /// Finds the user whose email address equals `email` exactly.
    ///
    /// Matching is case-sensitive.
    fn find_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>>;

    /// Finds a user by identifier.
    fn find_by_id(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Inserts a user and returns the stored record.
    ///
    /// Fails with [`StoreError::UniqueViolation`](crate::StoreError::UniqueViolation)
    /// if the email address is taken.
    fn insert_user(&self, user: NewUser) -> StoreFuture<'_, User>;
}

/// Lookup and mutation of courses.
pub trait CourseStore: Send + Sync + 'static {
    /// Returns every course, ordered by identifier.
    fn list_courses(&self) -> StoreFuture<'_, Vec<Course>>;

    /// Finds a course by identifier.
    fn find_course(&self, id: CourseId) -> StoreFuture<'_, Option<Course>>;

    /// Inserts a course and returns the stored record.
    ///
    /// Fails with [`StoreError::ForeignKey`](crate::StoreError::ForeignKey)
    /// if the owner does not exist.
    fn insert_course(&self, course: NewCourse) -> StoreFuture<'_, Course>;

    /// Applies `changes` to a course. Returns `None` if it does not exist.
    fn update_course(&self, id: CourseId, changes: CourseChanges)
        -> StoreFuture<'_, Option<Course>>;

    /// Deletes a course. Returns `false` if it did not exist.
    fn delete_course(&self, id: CourseId) -> StoreFuture<'_, bool>;
}
