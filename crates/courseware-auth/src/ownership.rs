//! Ownership authorization.

use courseware_core::{AuthenticatedUser, CoursewareError, Owned};

/// The fixed message returned when a caller does not own a resource.
pub const NOT_AUTHORIZED_MESSAGE: &str = "Not Authorized";

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipDecision {
    /// The caller owns the resource.
    Allow,
    /// The caller does not own the resource.
    Deny,
}

impl OwnershipDecision {
    /// Decides whether `user` may mutate `resource`.
    pub fn evaluate(user: &AuthenticatedUser, resource: &impl Owned) -> Self {
        if resource.is_owned_by(user) {
            Self::Allow
        } else {
            Self::Deny
        }
    }

    /// Returns `true` if the decision allows the mutation.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Fails with a 403 error unless `user` owns `resource`.
///
/// Callers load the resource first, so a missing resource has already been
/// answered with 404 by the time this runs.
pub fn authorize_owner(user: &AuthenticatedUser, resource: &impl Owned) -> Result<(), CoursewareError> {
    match OwnershipDecision::evaluate(user, resource) {
        OwnershipDecision::Allow => Ok(()),
        OwnershipDecision::Deny => {
            tracing::debug!(
                user_id = %user.id,
                owner_id = %resource.owner_id(),
                "ownership check denied"
            );
            Err(CoursewareError::authorization(NOT_AUTHORIZED_MESSAGE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseware_core::{ErrorCategory, UserId};

    struct Doc(UserId);

    impl Owned for Doc {
        fn owner_id(&self) -> UserId {
            self.0
        }
    }

    fn user(id: u64) -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(id),
            email_address: format!("user{id}@example.com"),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        }
    }

    #[test]
    fn test_owner_allowed() {
        assert!(authorize_owner(&user(1), &Doc(UserId::new(1))).is_ok());
        assert!(OwnershipDecision::evaluate(&user(1), &Doc(UserId::new(1))).is_allowed());
    }

    #[test]
    fn test_non_owner_forbidden() {
        let err = authorize_owner(&user(2), &Doc(UserId::new(1))).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Authorization);
        assert_eq!(err.client_message(), NOT_AUTHORIZED_MESSAGE);
    }
}
