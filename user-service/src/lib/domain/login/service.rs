use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::HashedSecret;

use crate::domain::login::errors::LoginError;
use crate::domain::login::models::LoginCommand;
use crate::domain::login::models::LoginPolicy;
use crate::domain::login::models::LoginSuccess;
use crate::domain::login::models::MigrationState;
use crate::domain::login::models::UserCredential;
use crate::domain::login::ports::CredentialStore;
use crate::domain::login::ports::LoginServicePort;
use crate::domain::user::models::UserId;

/// Login flow: credential lookup, legacy-password migration, token issuance.
///
/// Each attempt does one store read and at most one store write. Argon2 work
/// runs on the blocking pool.
pub struct LoginService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
    policy: LoginPolicy,
}

impl<CS> LoginService<CS>
where
    CS: CredentialStore,
{
    /// Create a new login service.
    ///
    /// # Arguments
    /// * `store` - Credential lookup and migration write
    /// * `authenticator` - Password hasher and token codec
    /// * `policy` - Treatment of accounts that still hold a legacy password
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>, policy: LoginPolicy) -> Self {
        Self {
            store,
            authenticator,
            policy,
        }
    }

    async fn run_blocking<T, F>(&self, task: F) -> Result<T, LoginError>
    where
        F: FnOnce(&Authenticator) -> T + Send + 'static,
        T: Send + 'static,
    {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || task(&authenticator))
            .await
            .map_err(|e| LoginError::Hashing(format!("Blocking task failed: {}", e)))
    }

    /// Reject with the same Argon2 cost a real verification pays, so every
    /// `InvalidCredentials` takes about as long regardless of which check failed.
    async fn reject_after_dummy_hash(
        &self,
        password: String,
    ) -> Result<LoginSuccess, LoginError> {
        self.run_blocking(move |authenticator| {
            let _ = authenticator.hash_password(&password);
        })
        .await?;
        Err(LoginError::InvalidCredentials)
    }

    async fn verify_and_issue(
        &self,
        id: UserId,
        password_hash: HashedSecret,
        password: String,
    ) -> Result<LoginSuccess, LoginError> {
        let user_id = id.to_string();
        let result = self
            .run_blocking(move |authenticator| {
                authenticator.authenticate(&password, &password_hash, &user_id)
            })
            .await??;

        Ok(LoginSuccess {
            user_id: id,
            token: result.access_token,
            migrated: false,
        })
    }

    async fn migrate_and_issue(
        &self,
        credential: &UserCredential,
        legacy_password: &str,
        password: String,
    ) -> Result<LoginSuccess, LoginError> {
        if !self.policy.migrate_without_verification
            && !constant_time_eq(password.as_bytes(), legacy_password.as_bytes())
        {
            return self.reject_after_dummy_hash(password).await;
        }

        let password_hash = self
            .run_blocking(move |authenticator| authenticator.hash_password(&password))
            .await?
            .map_err(|e| LoginError::Hashing(e.to_string()))?;

        let affected = self
            .store
            .update_password_hash(&credential.id, &password_hash)
            .await?;

        if affected == 0 {
            tracing::warn!(
                user_id = %credential.id,
                "Credential changed during legacy password migration"
            );
            return Err(LoginError::InvalidCredentials);
        }

        tracing::info!(
            user_id = %credential.id,
            verified = !self.policy.migrate_without_verification,
            "Legacy password migrated"
        );

        let token = self
            .authenticator
            .issue_token(&credential.id.to_string())
            .map_err(|e| LoginError::Signing(e.to_string()))?;

        Ok(LoginSuccess {
            user_id: credential.id,
            token,
            migrated: true,
        })
    }
}

#[async_trait]
impl<CS> LoginServicePort for LoginService<CS>
where
    CS: CredentialStore,
{
    async fn login(&self, command: LoginCommand) -> Result<LoginSuccess, LoginError> {
        let LoginCommand { name, password } = command;

        let Some(credential) = self.store.find_credential_by_name(&name).await? else {
            return self.reject_after_dummy_hash(password).await;
        };

        match credential.migration_state() {
            MigrationState::Migrated(password_hash) => {
                self.verify_and_issue(credential.id, password_hash.clone(), password)
                    .await
            }
            MigrationState::Legacy(legacy_password) => {
                self.migrate_and_issue(&credential, legacy_password, password)
                    .await
            }
            MigrationState::Unset => {
                tracing::warn!(user_id = %credential.id, "User has no stored credential");
                self.reject_after_dummy_hash(password).await
            }
        }
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
