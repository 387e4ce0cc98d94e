use std::fmt;

use auth::HashedSecret;
use serde::Deserialize;

use crate::domain::user::models::UserId;

/// Stored credential for one user, as read by the login flow.
///
/// Exactly one of `legacy_password` and `password_hash` is authoritative: once
/// `password_hash` is set, `legacy_password` is never consulted again.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub id: UserId,
    pub name: String,
    pub legacy_password: Option<String>,
    pub password_hash: Option<HashedSecret>,
}

impl UserCredential {
    pub fn migration_state(&self) -> MigrationState<'_> {
        match (&self.password_hash, &self.legacy_password) {
            (Some(hash), _) => MigrationState::Migrated(hash),
            (None, Some(legacy)) => MigrationState::Legacy(legacy),
            (None, None) => MigrationState::Unset,
        }
    }
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("legacy_password", &self.legacy_password.as_ref().map(|_| ".."))
            .field("password_hash", &self.password_hash)
            .finish()
    }
}

/// Which credential decides a login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState<'a> {
    /// Hashed password present
    Migrated(&'a HashedSecret),
    /// Only the plaintext password from before hashing was introduced
    Legacy(&'a str),
    /// No credential at all; nobody can log in as this user
    Unset,
}

/// How an unmigrated account is treated on its first login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LoginPolicy {
    /// Accept whatever password is supplied for a legacy account and store its
    /// hash, without comparing against the legacy value first.
    #[serde(default)]
    pub migrate_without_verification: bool,
}

/// Login attempt as received from the client.
#[derive(Clone)]
pub struct LoginCommand {
    pub name: String,
    pub password: String,
}

impl LoginCommand {
    pub fn new(name: String, password: String) -> Self {
        Self { name, password }
    }
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub user_id: UserId,
    pub token: String,
    /// True when this login converted a legacy password into a hash
    pub migrated: bool,
}
