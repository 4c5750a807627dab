//! In-memory store.

use chrono::Utc;
use courseware_core::{Course, CourseChanges, CourseId, NewCourse, NewUser, User, UserId};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::store::{CourseStore, StoreFuture, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    courses: BTreeMap<CourseId, Course>,
    last_user_id: u64,
    last_course_id: u64,
}

/// A store that keeps every record in process memory.
///
/// Identifiers start at 1 and are never reused. Constraints are checked
/// under the same write lock that performs the insert, so two concurrent
/// registrations with one email address cannot both succeed.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }

    /// Returns the number of stored courses.
    #[must_use]
    pub fn course_count(&self) -> usize {
        self.tables.read().courses.len()
    }

    fn insert_user_now(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write();
        if tables
            .users
            .values()
            .any(|existing| existing.email_address == user.email_address)
        {
            return Err(StoreError::unique("email_address"));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let stored = User {
            id: UserId::new(tables.last_user_id),
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(stored.id, stored.clone());
        tracing::debug!(user_id = %stored.id, "user inserted");
        Ok(stored)
    }

    fn insert_course_now(&self, course: NewCourse) -> Result<Course, StoreError> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&course.owner_id) {
            return Err(StoreError::foreign_key("owner_id", course.owner_id));
        }

        tables.last_course_id += 1;
        let now = Utc::now();
        let stored = Course {
            id: CourseId::new(tables.last_course_id),
            title: course.title,
            description: course.description,
            estimated_time: course.estimated_time,
            materials_needed: course.materials_needed,
            owner_id: course.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.courses.insert(stored.id, stored.clone());
        tracing::debug!(course_id = %stored.id, owner_id = %stored.owner_id, "course inserted");
        Ok(stored)
    }

    fn update_course_now(&self, id: CourseId, changes: &CourseChanges) -> Option<Course> {
        let mut tables = self.tables.write();
        let course = tables.courses.get_mut(&id)?;
        if changes.apply_to(course) {
            course.updated_at = Utc::now();
        }
        Some(course.clone())
    }
}

impl UserStore for InMemoryStore {
    fn find_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            Ok(self
                .tables
                .read()
                .users
                .values()
                .find(|user| user.email_address == email)
                .cloned())
        })
    }

    fn find_by_id(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move { Ok(self.tables.read().users.get(&id).cloned()) })
    }

    fn insert_user(&self, user: NewUser) -> StoreFuture<'_, User> {
        Box::pin(async move { self.insert_user_now(user) })
    }
}

impl CourseStore for InMemoryStore {
    fn list_courses(&self) -> StoreFuture<'_, Vec<Course>> {
        Box::pin(async move { Ok(self.tables.read().courses.values().cloned().collect()) })
    }

    fn find_course(&self, id: CourseId) -> StoreFuture<'_, Option<Course>> {
        Box::pin(async move { Ok(self.tables.read().courses.get(&id).cloned()) })
    }

    fn insert_course(&self, course: NewCourse) -> StoreFuture<'_, Course> {
        Box::pin(async move { self.insert_course_now(course) })
    }

    fn update_course(
        &self,
        id: CourseId,
        changes: CourseChanges,
    ) -> StoreFuture<'_, Option<Course>> {
        Box::pin(async move { Ok(self.update_course_now(id, &changes)) })
    }

    fn delete_course(&self, id: CourseId) -> StoreFuture<'_, bool> {
        Box::pin(async move { Ok(self.tables.write().courses.remove(&id).is_some()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Joe".to_string(),
            last_name: "Smith".to_string(),
            email_address: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_course(owner_id: UserId, title: &str) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            description: "A course".to_string(),
            estimated_time: None,
            materials_needed: None,
            owner_id,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = InMemoryStore::new();
        let user = store.insert_user(new_user("joe@smith.com")).await.unwrap();

        assert_eq!(user.id, UserId::new(1));
        let found = store.find_by_email("joe@smith.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(store.find_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_by_email_is_case_sensitive() {
        let store = InMemoryStore::new();
        store.insert_user(new_user("joe@smith.com")).await.unwrap();

        assert!(store.find_by_email("Joe@Smith.com").await.unwrap().is_none());
        assert!(store.find_by_email("joe@smith.co").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryStore::new();
        store.insert_user(new_user("a@b.com")).await.unwrap();

        let err = store.insert_user(new_user("a@b.com")).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert_user(new_user("race@b.com")).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_course_requires_existing_owner() {
        let store = InMemoryStore::new();
        let err = store
            .insert_course(new_course(UserId::new(42), "Orphan"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ForeignKey { field: "owner_id", .. }));
        assert_eq!(store.course_count(), 0);
    }

    #[tokio::test]
    async fn test_course_lifecycle() {
        let store = InMemoryStore::new();
        let owner = store.insert_user(new_user("joe@smith.com")).await.unwrap();
        let first = store.insert_course(new_course(owner.id, "First")).await.unwrap();
        let second = store.insert_course(new_course(owner.id, "Second")).await.unwrap();
        assert_eq!(first.id, CourseId::new(1));
        assert_eq!(second.id, CourseId::new(2));

        let changes = CourseChanges {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = store.update_course(first.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.owner_id, owner.id);

        assert!(store.delete_course(first.id).await.unwrap());
        assert!(!store.delete_course(first.id).await.unwrap());

        let remaining = store.list_courses().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);
    }

    #[tokio::test]
    async fn test_repeated_update_keeps_timestamp() {
        let store = InMemoryStore::new();
        let owner = store.insert_user(new_user("joe@smith.com")).await.unwrap();
        let course = store.insert_course(new_course(owner.id, "First")).await.unwrap();

        let rename = CourseChanges {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let first = store.update_course(course.id, rename.clone()).await.unwrap().unwrap();
        assert!(first.updated_at >= course.updated_at);

        let again = store.update_course(course.id, rename).await.unwrap().unwrap();
        assert_eq!(again.updated_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let owner = store.insert_user(new_user("joe@smith.com")).await.unwrap();
        let first = store.insert_course(new_course(owner.id, "First")).await.unwrap();
        store.delete_course(first.id).await.unwrap();

        let next = store.insert_course(new_course(owner.id, "Next")).await.unwrap();
        assert_eq!(next.id, CourseId::new(2));
    }

    #[tokio::test]
    async fn test_update_missing_course() {
        let store = InMemoryStore::new();
        let result = store
            .update_course(CourseId::new(999), CourseChanges::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
