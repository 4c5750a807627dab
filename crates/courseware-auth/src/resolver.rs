//! Identity resolution and request authentication.

use courseware_core::{AuthenticatedUser, CoursewareError, User};
use courseware_store::{StoreError, UserStore};
use std::sync::Arc;
use thiserror::Error;

use crate::credentials::BasicCredentials;
use crate::secret::{SecretError, SecretHasher};

/// Why a request could not be authenticated.
///
/// The first three variants are rejections: their text goes to the operator
/// log and the client only ever sees "Access Denied". The last two are
/// infrastructure failures and surface as internal errors.
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// No usable `Authorization` header.
    #[error("Auth header not found")]
    MissingCredentials,

    /// No user has the supplied email address.
    #[error("User not found for username: {name}")]
    UnknownUser {
        /// The name from the credentials.
        name: String,
    },

    /// The secret did not verify against the stored hash.
    #[error("Authentication failure for username: {name}")]
    BadSecret {
        /// The stored email address of the user.
        name: String,
    },

    /// The user store failed.
    #[error("user lookup failed: {0}")]
    Store(#[from] StoreError),

    /// The verifier task failed.
    #[error("secret verification failed: {0}")]
    Verifier(#[from] SecretError),
}

impl AuthFailure {
    /// Returns `true` if the request should be answered with 401.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::UnknownUser { .. } | Self::BadSecret { .. }
        )
    }
}

impl From<AuthFailure> for CoursewareError {
    fn from(failure: AuthFailure) -> Self {
        if failure.is_rejection() {
            Self::authentication(failure.to_string())
        } else {
            Self::internal_with_source("Authentication could not be completed", failure)
        }
    }
}

/// Looks users up by login name.
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    /// Creates a resolver over a user store.
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Returns the user whose email address equals `name` exactly.
    pub async fn resolve(&self, name: &str) -> Result<Option<User>, StoreError> {
        self.users.find_by_email(name).await
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}

/// Turns an `Authorization` header into an authenticated user.
#[derive(Debug, Clone)]
pub struct Authenticator {
    resolver: IdentityResolver,
    hasher: SecretHasher,
}

impl Authenticator {
    /// Creates an authenticator.
    pub fn new(resolver: IdentityResolver, hasher: SecretHasher) -> Self {
        Self { resolver, hasher }
    }

    /// Authenticates the raw value of an `Authorization` header.
    ///
    /// Extraction, lookup and verification run in that order; the first step
    /// that fails decides the [`AuthFailure`].
    pub async fn authenticate(
        &self,
        header: Option<&str>,
    ) -> Result<AuthenticatedUser, AuthFailure> {
        let credentials = header
            .and_then(BasicCredentials::from_header_value)
            .ok_or(AuthFailure::MissingCredentials)?;

        let user = self
            .resolver
            .resolve(&credentials.name)
            .await?
            .ok_or_else(|| AuthFailure::UnknownUser {
                name: credentials.name.clone(),
            })?;

        let verified = self
            .hasher
            .verify(credentials.secret, user.password_hash.clone())
            .await?;
        if !verified {
            return Err(AuthFailure::BadSecret {
                name: user.email_address,
            });
        }

        Ok(AuthenticatedUser::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::HashParams;
    use courseware_core::{ErrorCategory, NewUser, UserId};
    use courseware_store::{InMemoryStore, StoreFuture};

    async fn setup() -> Authenticator {
        let hasher = SecretHasher::new(HashParams::minimal()).unwrap();
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_user(NewUser {
                first_name: "Joe".to_string(),
                last_name: "Smith".to_string(),
                email_address: "joe@smith.com".to_string(),
                password_hash: hasher.hash_blocking("joepassword").unwrap(),
            })
            .await
            .unwrap();
        Authenticator::new(IdentityResolver::new(store), hasher)
    }

    fn header(name: &str, secret: &str) -> String {
        BasicCredentials {
            name: name.to_string(),
            secret: secret.to_string(),
        }
        .to_header_value()
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let auth = setup().await;
        let user = auth
            .authenticate(Some(&header("joe@smith.com", "joepassword")))
            .await
            .unwrap();

        assert_eq!(user.id, UserId::new(1));
        assert_eq!(user.display_name(), "Joe Smith");
    }

    #[tokio::test]
    async fn test_missing_header() {
        let auth = setup().await;
        let err = auth.authenticate(None).await.unwrap_err();
        assert_eq!(err.to_string(), "Auth header not found");

        let err = auth.authenticate(Some("Bearer token")).await.unwrap_err();
        assert!(matches!(err, AuthFailure::MissingCredentials));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let auth = setup().await;
        let err = auth
            .authenticate(Some(&header("Joe@Smith.com", "joepassword")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User not found for username: Joe@Smith.com");
    }

    #[tokio::test]
    async fn test_bad_secret() {
        let auth = setup().await;
        let err = auth
            .authenticate(Some(&header("joe@smith.com", "nope")))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Authentication failure for username: joe@smith.com"
        );
        assert!(err.is_rejection());
    }

    struct BrokenStore;

    impl UserStore for BrokenStore {
        fn find_by_email<'a>(&'a self, _email: &'a str) -> StoreFuture<'a, Option<User>> {
            Box::pin(async { Err(StoreError::Unavailable("connection refused".into())) })
        }

        fn find_by_id(&self, _id: UserId) -> StoreFuture<'_, Option<User>> {
            Box::pin(async { Err(StoreError::Unavailable("connection refused".into())) })
        }

        fn insert_user(&self, _user: NewUser) -> StoreFuture<'_, User> {
            Box::pin(async { Err(StoreError::Unavailable("connection refused".into())) })
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let auth = Authenticator::new(
            IdentityResolver::new(Arc::new(BrokenStore)),
            SecretHasher::new(HashParams::minimal()).unwrap(),
        );
        let err = auth
            .authenticate(Some(&header("joe@smith.com", "joepassword")))
            .await
            .unwrap_err();

        assert!(!err.is_rejection());
        assert_eq!(
            CoursewareError::from(err).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_rejection_maps_to_authentication_error() {
        let err = CoursewareError::from(AuthFailure::MissingCredentials);
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert_eq!(err.client_message(), "Access Denied");
    }
}
