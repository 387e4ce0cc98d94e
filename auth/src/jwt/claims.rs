use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Identity claim carried inside a session token.
///
/// Serialized with the registered JWT claim names (`sub`, `iat`, `exp`);
/// timestamps are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaim {
    /// Subject (user identifier)
    #[serde(rename = "sub")]
    pub user_id: String,

    /// Issued at
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Expiration time
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl SessionClaim {
    /// Build a claim for `user_id` issued at `now` and valid for `ttl`.
    pub fn new(user_id: impl ToString, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id: user_id.to_string(),
            issued_at: now.timestamp(),
            expires_at: (now + ttl).timestamp(),
        }
    }

    /// A claim is valid strictly before its expiry instant.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.expires_at
    }
}
