use async_trait::async_trait;
use auth::HashedSecret;

use crate::domain::login::errors::LoginError;
use crate::domain::login::models::LoginCommand;
use crate::domain::login::models::LoginSuccess;
use crate::domain::login::models::UserCredential;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for the login flow.
#[async_trait]
pub trait LoginServicePort: Send + Sync + 'static {
    /// Verify credentials, migrating a legacy password when needed, and issue a session token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user or wrong password
    /// * `Store` - Credential store unavailable
    /// * `Hashing` - Password hashing failed
    /// * `Signing` - Token signing failed
    async fn login(&self, command: LoginCommand) -> Result<LoginSuccess, LoginError>;
}

/// Credential storage used by the login flow.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Fetch the stored credential for a user name.
    ///
    /// # Returns
    /// Optional credential (None if no user has this name)
    async fn find_credential_by_name(&self, name: &str)
        -> Result<Option<UserCredential>, UserError>;

    /// Store a password hash for a user that has none yet.
    ///
    /// Conditional on `password_hash` still being unset, and clears the legacy
    /// plaintext in the same write.
    ///
    /// # Returns
    /// Number of rows changed (0 when the user no longer exists or was already migrated)
    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &HashedSecret,
    ) -> Result<u64, UserError>;
}
