use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use staffline_application::ProvisionUserInput;
use staffline_core::{UserId, UserIdentity};
use staffline_domain::{AccountStatus, Role};

use crate::dto::{
    ChangeRoleRequest, ChangeStatusRequest, ProfileResponse, ProvisionUserRequest, RoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let profiles = state
        .session()
        .user_admin_service
        .list_users(&user)
        .await?
        .into_iter()
        .map(ProfileResponse::from)
        .collect();

    Ok(Json(profiles))
}

pub async fn provision_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<ProvisionUserRequest>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    let role = Role::from_str(payload.role.as_str())?;

    let profile = state
        .session()
        .user_admin_service
        .provision_user(
            &user,
            ProvisionUserInput {
                email: payload.email,
                full_name: payload.full_name,
                role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

pub async fn change_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let target = UserId::from_str(user_id.as_str())?;
    let role = Role::from_str(payload.role.as_str())?;

    let effective_role = state
        .session()
        .user_admin_service
        .change_role(&user, target, role)
        .await?;

    Ok(Json(RoleResponse {
        user_id: target.to_string(),
        role: effective_role.as_str().to_owned(),
    }))
}

pub async fn change_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<ChangeStatusRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let target = UserId::from_str(user_id.as_str())?;
    let status = AccountStatus::from_str(payload.status.as_str())?;

    let profile = state
        .session()
        .user_admin_service
        .set_account_status(&user, target, status)
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}
