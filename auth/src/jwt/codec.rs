use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::SessionClaim;
use super::errors::TokenError;

/// Session token codec.
///
/// Issues and verifies compact JWTs signed with HS256 (HMAC with SHA-256)
/// under a single symmetric secret. Tokens are valid for one hour from issuance.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Lifetime of every issued token.
    pub const TOKEN_TTL_SECONDS: i64 = 60 * 60;

    /// Create a codec bound to a signing secret.
    ///
    /// # Arguments
    /// * `secret` - Symmetric signing key (should be at least 32 bytes for HS256)
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `verify_at` once the signature holds, with no leeway
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `user_id`, valid from now for one hour.
    ///
    /// # Errors
    /// * `Signing` - Token encoding failed
    pub fn issue(&self, user_id: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claim = SessionClaim::new(user_id, now, Duration::seconds(Self::TOKEN_TTL_SECONDS));

        encode(&Header::new(Algorithm::HS256), &claim, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return the user identifier it was issued for.
    ///
    /// # Errors
    /// * `Malformed` - Not a three-part compact token, or signed claims of the wrong shape
    /// * `BadSignature` - Signature does not match the token contents
    /// * `Expired` - Current time is at or past the token's expiry
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// The signature is checked before any claim is read, so `exp` is only
    /// trusted once it is known to be authentic.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|segment| segment.is_empty()) {
            return Err(TokenError::Malformed(
                "expected header.payload.signature".to_string(),
            ));
        }

        // Any failure up to and including the signature check means the bytes
        // are not authenticated by our key
        let token_data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::BadSignature)?;

        let claim: SessionClaim = serde_json::from_value(token_data.claims)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        if claim.is_expired(now.timestamp()) {
            return Err(TokenError::Expired);
        }

        Ok(claim.user_id)
    }
}
