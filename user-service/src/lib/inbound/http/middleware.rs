use auth::TokenCodec;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Identity attached to request extensions once a session token is accepted.
///
/// The id is whatever the token's subject carries; it is not checked against
/// the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoToken,
    InvalidToken,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::NoToken => "Unauthorized: No token provided",
            RejectReason::InvalidToken => "Unauthorized: Invalid token",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Authenticated { user_id: String },
    Rejected { reason: RejectReason },
}

/// Decide whether the request carries a valid session token.
///
/// The `Authorization` header may hold the raw token or `Bearer <token>`.
pub fn evaluate(codec: &TokenCodec, headers: &HeaderMap) -> AuthResult {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return AuthResult::Rejected {
            reason: RejectReason::NoToken,
        };
    };

    let Ok(value) = value.to_str() else {
        tracing::warn!("Authorization header is not valid UTF-8");
        return AuthResult::Rejected {
            reason: RejectReason::InvalidToken,
        };
    };

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(value)
        .trim();
    if token.is_empty() {
        return AuthResult::Rejected {
            reason: RejectReason::NoToken,
        };
    }

    match codec.verify(token) {
        Ok(user_id) => AuthResult::Authenticated { user_id },
        Err(e) => {
            tracing::warn!(error = %e, "Session token rejected");
            AuthResult::Rejected {
                reason: RejectReason::InvalidToken,
            }
        }
    }
}

/// Middleware guarding session-only routes.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match evaluate(state.authenticator.token_codec(), req.headers()) {
        AuthResult::Authenticated { user_id } => {
            req.extensions_mut().insert(AuthenticatedUser { user_id });
            next.run(req).await
        }
        AuthResult::Rejected { reason } => {
            ApiError::Unauthorized(reason.message().to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::Duration;
    use chrono::Utc;

    use super::*;

    const SECRET: &[u8] = b"middleware-test-secret";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_is_no_token() {
        let codec = TokenCodec::new(SECRET);
        assert_eq!(
            evaluate(&codec, &HeaderMap::new()),
            AuthResult::Rejected {
                reason: RejectReason::NoToken
            }
        );
    }

    #[test]
    fn test_empty_header_is_no_token() {
        let codec = TokenCodec::new(SECRET);
        for value in ["", "Bearer ", "   "] {
            assert_eq!(
                evaluate(&codec, &headers_with(value)),
                AuthResult::Rejected {
                    reason: RejectReason::NoToken
                },
                "header {:?}",
                value
            );
        }
    }

    #[test]
    fn test_raw_and_bearer_tokens_accepted() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue("user-42").unwrap();

        let expected = AuthResult::Authenticated {
            user_id: "user-42".to_string(),
        };
        assert_eq!(evaluate(&codec, &headers_with(&token)), expected);
        assert_eq!(
            evaluate(&codec, &headers_with(&format!("Bearer {}", token))),
            expected
        );
    }

    #[test]
    fn test_bad_tokens_are_invalid() {
        let codec = TokenCodec::new(SECRET);
        let foreign = TokenCodec::new(b"some-other-secret").issue("user-42").unwrap();
        let expired = codec
            .issue_at("user-42", Utc::now() - Duration::hours(2))
            .unwrap();

        for value in ["invalid.token.here", "garbage", foreign.as_str(), expired.as_str()] {
            assert_eq!(
                evaluate(&codec, &headers_with(value)),
                AuthResult::Rejected {
                    reason: RejectReason::InvalidToken
                },
                "header {:?}",
                value
            );
        }
    }

    #[test]
    fn test_non_utf8_header_is_invalid() {
        let codec = TokenCodec::new(SECRET);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());

        assert_eq!(
            evaluate(&codec, &headers),
            AuthResult::Rejected {
                reason: RejectReason::InvalidToken
            }
        );
    }
}
