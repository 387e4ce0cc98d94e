use crate::jwt::TokenCodec;
use crate::jwt::TokenError;
use crate::password::HashedSecret;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// Built once at startup from the process-wide signing secret and shared
/// read-only between requests.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
}

/// Result of successful authentication.
#[derive(Debug)]
pub struct AuthenticationResult {
    /// Signed session token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator with default hashing parameters.
    ///
    /// # Arguments
    /// * `secret` - Secret key for token signing
    pub fn new(secret: &[u8]) -> Self {
        Self::with_password_hasher(secret, PasswordHasher::new())
    }

    /// Create a new authenticator with an explicitly tuned password hasher.
    pub fn with_password_hasher(secret: &[u8], password_hasher: PasswordHasher) -> Self {
        Self {
            password_hasher,
            token_codec: TokenCodec::new(secret),
        }
    }

    pub fn token_codec(&self) -> &TokenCodec {
        &self.token_codec
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<HashedSecret, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against a stored hash and issue a token for `user_id`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match (or the stored hash is unreadable)
    /// * `TokenError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &HashedSecret,
        user_id: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.token_codec.issue(user_id)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Issue a token without password verification.
    ///
    /// Used once the caller has established the identity by other means.
    pub fn issue_token(&self, user_id: &str) -> Result<String, TokenError> {
        self.token_codec.issue(user_id)
    }

    /// Validate a token and return the user identifier it carries.
    pub fn validate_token(&self, token: &str) -> Result<String, TokenError> {
        self.token_codec.verify(token)
    }
}
