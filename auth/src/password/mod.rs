pub mod argon2;
pub mod errors;

pub use argon2::HashedSecret;
pub use argon2::PasswordHasher;
pub use errors::PasswordError;
