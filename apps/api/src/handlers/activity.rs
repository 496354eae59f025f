use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Query, State};
use serde::Deserialize;
use staffline_application::{ActivityLogQuery, MAX_EXPORT_ROWS, MAX_FEED_PAGE};
use staffline_core::UserIdentity;
use staffline_domain::ActivityScope;

use crate::dto::{ActivityExportResponse, ActivityFeedResponse};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivityFeedParams {
    pub scope: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
}

impl ActivityFeedParams {
    fn into_query(self, default_limit: usize) -> ActivityLogQuery {
        ActivityLogQuery {
            limit: self.limit.unwrap_or(default_limit),
            offset: self.offset.unwrap_or(0),
            action: self.action,
            entity_type: self.entity_type,
            since: None,
            visible_to: None,
        }
    }
}

pub async fn list_activity_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<ActivityFeedParams>,
) -> ApiResult<Json<ActivityFeedResponse>> {
    let requested_scope = params
        .scope
        .as_deref()
        .map(ActivityScope::from_str)
        .transpose()?
        .unwrap_or(ActivityScope::All);

    let feed = state
        .session()
        .activity_feed_service
        .list_activity(&user, requested_scope, params.into_query(MAX_FEED_PAGE))
        .await?;

    Ok(Json(ActivityFeedResponse::from(feed)))
}

pub async fn export_activity_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<ActivityFeedParams>,
) -> ApiResult<Json<ActivityExportResponse>> {
    let export = state
        .session()
        .activity_feed_service
        .export_activity(&user, params.into_query(MAX_EXPORT_ROWS))
        .await?;

    Ok(Json(ActivityExportResponse::from(export)))
}
