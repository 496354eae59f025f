use axum::Json;
use axum::extract::{Extension, State};
use staffline_core::UserIdentity;
use staffline_domain::PermissionMatrix;

use crate::dto::MeResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<MeResponse>> {
    let role = state.session().role_resolver.resolve(user.user_id()).await;

    Ok(Json(MeResponse::new(
        &user,
        role,
        PermissionMatrix::capabilities(role),
    )))
}
