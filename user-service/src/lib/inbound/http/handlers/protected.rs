use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

/// Route gated by the session middleware. Any valid token is accepted; there
/// is no per-user authorization here.
pub async fn protected(
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiSuccess<ProtectedResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        ProtectedResponseData {
            message: "Protected route accessed successfully".to_string(),
            user_id: user.user_id,
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectedResponseData {
    pub message: String,
    pub user_id: String,
}
