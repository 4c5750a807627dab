//! Stored records and their write and read models.
//!
//! Records ([`User`], [`Course`]) are what the store holds. Write models
//! ([`NewUser`], [`NewCourse`], [`CourseChanges`]) are what handlers hand to the
//! store. Read models ([`UserSummary`], [`CourseView`]) are what clients see:
//! they never include password hashes or timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::identity::{Owned, UserId};

/// Identifier of a stored course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(u64);

impl CourseId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CourseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identifier assigned by the store.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Unique login name, compared case-sensitively.
    pub email_address: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns the client-facing summary of this user.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email_address: self.email_address.clone(),
        }
    }
}

/// A user to be inserted. The password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Unique login name.
    pub email_address: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
}

/// A stored course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    /// Identifier assigned by the store.
    pub id: CourseId,
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: String,
    /// Free-form time estimate.
    pub estimated_time: Option<String>,
    /// Free-form list of materials.
    pub materials_needed: Option<String>,
    /// The user that created the course. Fixed at creation.
    pub owner_id: UserId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Owned for Course {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

/// A course to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: String,
    /// Free-form time estimate.
    pub estimated_time: Option<String>,
    /// Free-form list of materials.
    pub materials_needed: Option<String>,
    /// The creating user.
    pub owner_id: UserId,
}

/// Changes applied to an existing course.
///
/// `None` leaves a field untouched. For the optional fields, `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseChanges {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New time estimate.
    pub estimated_time: Option<Option<String>>,
    /// New materials list.
    pub materials_needed: Option<Option<String>>,
}

impl CourseChanges {
    /// Applies the changes to `course` in place.
    ///
    /// Returns `true` only if a stored value actually changed.
    pub fn apply_to(&self, course: &mut Course) -> bool {
        let mut changed = false;
        if let Some(title) = &self.title {
            changed |= replace(&mut course.title, title);
        }
        if let Some(description) = &self.description {
            changed |= replace(&mut course.description, description);
        }
        if let Some(estimated_time) = &self.estimated_time {
            changed |= replace(&mut course.estimated_time, estimated_time);
        }
        if let Some(materials_needed) = &self.materials_needed {
            changed |= replace(&mut course.materials_needed, materials_needed);
        }
        changed
    }
}

fn replace<T: Clone + PartialEq>(slot: &mut T, value: &T) -> bool {
    if slot == value {
        return false;
    }
    slot.clone_from(value);
    true
}

/// Public view of a user, embedded in course responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User identifier.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login name.
    pub email_address: String,
}

/// Public view of a course with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    /// Course identifier.
    pub id: CourseId,
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: String,
    /// Free-form time estimate.
    pub estimated_time: Option<String>,
    /// Free-form list of materials.
    pub materials_needed: Option<String>,
    /// Owner identifier.
    pub user_id: UserId,
    /// Owner details.
    pub owner: UserSummary,
}

impl CourseView {
    /// Joins a course with its owner.
    #[must_use]
    pub fn new(course: Course, owner: &User) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            estimated_time: course.estimated_time,
            materials_needed: course.materials_needed,
            user_id: course.owner_id,
            owner: owner.summary(),
        }
    }
}
