//! Authentication utilities library
//!
//! Provides the authentication primitives used by the user service:
//! - Password hashing (Argon2id) with constant-time verification
//! - Signed, time-bounded session tokens (HS256 JWT)
//! - Authentication coordination
//!
//! Services own their credential storage and login policy; this crate only
//! knows about passwords, hashes and tokens.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::TokenCodec;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let token = codec.issue("user123").unwrap();
//! assert_eq!(codec.verify(&token).unwrap(), "user123");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::Authenticator;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue token
//! let result = auth.authenticate("password123", &hash, "user123").unwrap();
//!
//! // Request: validate token
//! let user_id = auth.validate_token(&result.access_token).unwrap();
//! assert_eq!(user_id, "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::SessionClaim;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use password::HashedSecret;
pub use password::PasswordError;
pub use password::PasswordHasher;
