//! Secret hashing and verification.
//!
//! Secrets are hashed with argon2id into PHC strings. The salt comes from the
//! OS random source, so hashing the same secret twice never yields the same
//! string; only verification is reproducible. Both operations are CPU-bound
//! and the async variants run them on tokio's blocking pool.

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

/// Errors raised while hashing a secret.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The cost parameters were rejected by argon2.
    #[error("invalid hash parameters: {0}")]
    InvalidParams(String),

    /// No salt could be generated.
    #[error("salt generation failed: {0}")]
    Salt(String),

    /// argon2 failed to produce a hash.
    #[error("hashing failed: {0}")]
    Hash(String),

    /// The blocking task was cancelled or panicked.
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Tunable argon2 cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashParams {
    /// The smallest cost argon2 accepts. Only meant for tests.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

/// Hashes and verifies secrets.
#[derive(Debug, Clone)]
pub struct SecretHasher {
    params: Params,
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl SecretHasher {
    /// Creates a hasher with the given cost.
    pub fn new(params: HashParams) -> Result<Self, SecretError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| SecretError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `plaintext` on the current thread.
    pub fn hash_blocking(&self, plaintext: &str) -> Result<String, SecretError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| SecretError::Salt(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| SecretError::Salt(e.to_string()))?;

        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| SecretError::Hash(e.to_string()))
    }

    /// Checks `plaintext` against a stored PHC hash on the current thread.
    ///
    /// The cost is read from the hash itself, so hashes made with other
    /// parameters still verify. A malformed hash is logged and never matches.
    #[must_use]
    pub fn verify_blocking(&self, plaintext: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::error!(error = %e, "stored password hash is malformed");
                false
            }
        }
    }

    /// Hashes `plaintext` on the blocking pool.
    pub async fn hash(&self, plaintext: String) -> Result<String, SecretError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&plaintext)).await?
    }

    /// Verifies `plaintext` against `hash` on the blocking pool.
    pub async fn verify(&self, plaintext: String, hash: String) -> Result<bool, SecretError> {
        let hasher = self.clone();
        Ok(tokio::task::spawn_blocking(move || hasher.verify_blocking(&plaintext, &hash)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> SecretHasher {
        SecretHasher::new(HashParams::minimal()).unwrap()
    }

    #[test]
    fn test_hash_is_not_plaintext_and_verifies() {
        let hasher = hasher();
        let hash = hasher.hash_blocking("joepassword").unwrap();

        assert_ne!(hash, "joepassword");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_blocking("joepassword", &hash));
        assert!(!hasher.verify_blocking("JoePassword", &hash));
        assert!(!hasher.verify_blocking("", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = hasher();
        let first = hasher.hash_blocking("same").unwrap();
        let second = hasher.hash_blocking("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let hasher = hasher();
        assert!(!hasher.verify_blocking("pw", "not a phc string"));
        assert!(!hasher.verify_blocking("pw", ""));
    }

    #[test]
    fn test_verifies_hash_made_with_other_cost() {
        let strong = SecretHasher::new(HashParams {
            memory_kib: 4096,
            iterations: 3,
            parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash_blocking("pw").unwrap();
        assert!(hasher().verify_blocking("pw", &hash));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let err = SecretHasher::new(HashParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        })
        .unwrap_err();
        assert!(matches!(err, SecretError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let hasher = hasher();
        let hash = hasher.hash("sallypassword".to_string()).await.unwrap();

        assert!(hasher
            .verify("sallypassword".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!hasher.verify("wrong".to_string(), hash).await.unwrap());
    }
}
