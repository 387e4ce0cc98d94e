use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Stored password hash in PHC string format.
///
/// Carries the algorithm, cost parameters and salt alongside the digest, so a
/// hash produced under older parameters still verifies after the cost changes.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedSecret(String);

impl HashedSecret {
    /// Wrap a hash loaded from storage. The contents are not validated here;
    /// a malformed value simply never verifies.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedSecret(..)")
    }
}

/// Password hashing implementation.
///
/// Argon2id with a per-hash random salt. The work factor (memory, iterations,
/// lanes) is fixed at construction.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a password hasher with Argon2's recommended parameters.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Create a password hasher with an explicit work factor.
    ///
    /// # Arguments
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Number of passes
    /// * `parallelism` - Number of lanes
    ///
    /// # Errors
    /// * `InvalidParameters` - Parameters are outside Argon2's accepted ranges
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password.
    ///
    /// Two calls with the same input yield different hashes (fresh salt each time).
    ///
    /// # Errors
    /// * `HashingFailed` - Argon2 rejected the input (not reachable for ordinary passwords)
    pub fn hash(&self, password: &str) -> Result<HashedSecret, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| HashedSecret(hash.to_string()))
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// Parameters and salt are taken from the stored hash. The digest
    /// comparison is constant-time. A hash that does not parse verifies as `false`.
    pub fn verify(&self, password: &str, hashed: &HashedSecret) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hashed.as_str()) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
