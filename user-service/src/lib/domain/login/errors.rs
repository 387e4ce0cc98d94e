use thiserror::Error;

use crate::user::errors::UserError;

/// Terminal failures of a login attempt.
///
/// Unknown user and wrong password both surface as `InvalidCredentials`.
#[derive(Debug, Clone, Error)]
pub enum LoginError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Credential store error: {0}")]
    Store(#[from] UserError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl From<auth::AuthenticationError> for LoginError {
    fn from(err: auth::AuthenticationError) -> Self {
        match err {
            auth::AuthenticationError::InvalidCredentials => LoginError::InvalidCredentials,
            auth::AuthenticationError::TokenError(e) => LoginError::Signing(e.to_string()),
        }
    }
}
