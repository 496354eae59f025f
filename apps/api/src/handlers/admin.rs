use axum::Json;
use axum::extract::{Extension, State};
use staffline_core::UserIdentity;

use crate::dto::AdminSummaryResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn admin_summary_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<AdminSummaryResponse>> {
    let summary = state
        .session()
        .admin_console_service
        .load_summary(&user)
        .await?;

    Ok(Json(AdminSummaryResponse::from(summary)))
}
