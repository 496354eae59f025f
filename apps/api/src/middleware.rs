use std::str::FromStr;

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use staffline_core::{AppError, UserId, UserIdentity};

use crate::error::ApiResult;

/// Header carrying the account id asserted by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-staffline-user-id";
/// Optional header carrying the display name.
pub const USER_NAME_HEADER: &str = "x-staffline-user-name";
/// Optional header carrying the email.
pub const USER_EMAIL_HEADER: &str = "x-staffline-user-email";

pub async fn require_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers())?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn identity_from_headers(headers: &HeaderMap) -> Result<UserIdentity, AppError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let raw_user_id = header(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let user_id = UserId::from_str(raw_user_id)
        .map_err(|_| AppError::Unauthorized("invalid identity header".to_owned()))?;
    let display_name = header(USER_NAME_HEADER)
        .map(str::to_owned)
        .unwrap_or_else(|| user_id.to_string());

    Ok(UserIdentity::new(
        user_id,
        display_name,
        header(USER_EMAIL_HEADER).map(str::to_owned),
    ))
}
