//! Caller identity types.
//!
//! A request starts out [`CallerIdentity::Anonymous`]. The authentication
//! stage replaces it with [`CallerIdentity::User`] once the credentials in the
//! request have been verified against a stored user. The identity lives only
//! for the duration of one request and is never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::User;

/// Identifier of a stored user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
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

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// The user a request was authenticated as.
///
/// Carries the public parts of the stored [`User`]; the password hash never
/// leaves the store and authentication layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Identifier of the stored user.
    pub id: UserId,
    /// Unique login name.
    pub email_address: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl AuthenticatedUser {
    /// Returns `"<first> <last>"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email_address: user.email_address.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Identity of the caller for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CallerIdentity {
    /// No credentials were checked (public operation) or none were valid.
    #[default]
    Anonymous,
    /// Credentials were verified against a stored user.
    User(AuthenticatedUser),
}

impl CallerIdentity {
    /// Returns the authenticated user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::User(user) => Some(user),
            Self::Anonymous => None,
        }
    }

    /// Returns a string identifier suitable for logging.
    ///
    /// Never includes secrets.
    #[must_use]
    pub fn log_id(&self) -> String {
        match self {
            Self::User(user) => format!("user:{}", user.id),
            Self::Anonymous => "anonymous".to_string(),
        }
    }
}

/// A record with exactly one owning user.
pub trait Owned {
    /// Returns the identifier of the owning user.
    fn owner_id(&self) -> UserId;

    /// Returns `true` if `user` owns this record.
    fn is_owned_by(&self, user: &AuthenticatedUser) -> bool {
        self.owner_id() == user.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(1),
            email_address: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
        }
    }

    struct Note {
        owner: UserId,
    }

    impl Owned for Note {
        fn owner_id(&self) -> UserId {
            self.owner
        }
    }

    #[test]
    fn test_default_identity_is_anonymous() {
        let identity = CallerIdentity::default();
        assert!(identity.user().is_none());
        assert_eq!(identity.log_id(), "anonymous");
    }

    #[test]
    fn test_user_log_id() {
        let identity = CallerIdentity::User(alice());
        assert_eq!(identity.log_id(), "user:1");
        assert_eq!(identity.user().map(|u| u.id), Some(UserId::new(1)));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(alice().display_name(), "Alice Liddell");
    }

    #[test]
    fn test_is_owned_by() {
        let mine = Note { owner: UserId::new(1) };
        let theirs = Note { owner: UserId::new(2) };

        assert!(mine.is_owned_by(&alice()));
        assert!(!theirs.is_owned_by(&alice()));
    }

    #[test]
    fn test_user_id_parse() {
        assert_eq!("42".parse::<UserId>().ok(), Some(UserId::new(42)));
        assert!("abc".parse::<UserId>().is_err());
    }
}
