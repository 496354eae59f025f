use std::sync::Arc;

use serde_json::Map;
use staffline_core::{AppResult, UserId, UserIdentity};
use staffline_domain::{
    ActivityAction, ActivityDetails, ActivityEvent, ActivityLogRecord, ActivityScope, Capability,
    DataExportedDetails, PermissionMatrix, Role, ScopeCounts, VisibilityRule, scope_permitted,
};
use tracing::warn;

use crate::{
    ActivityLogQuery, ActivityLogRepository, ActivityRecorder, RecordActivityInput, RoleResolver,
};

/// Largest page served by the activity feed.
pub const MAX_FEED_PAGE: usize = 200;

/// Largest number of events included in one export.
pub const MAX_EXPORT_ROWS: usize = 10_000;

/// One page of the activity feed as seen by a viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityFeed {
    /// Scope applied after downgrading the request.
    pub effective_scope: ActivityScope,
    /// Visible events, newest first.
    pub events: Vec<ActivityEvent>,
    /// Per-scope counts over every row matching the filters.
    pub counts: ScopeCounts,
    /// Stored rows that failed validation and were left out.
    pub skipped_rows: usize,
}

/// Full activity export for super admins.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityExport {
    /// Exported events, newest first.
    pub events: Vec<ActivityEvent>,
    /// Stored rows that failed validation and were left out.
    pub skipped_rows: usize,
}

/// Read path of the activity log.
#[derive(Clone)]
pub struct ActivityFeedService {
    role_resolver: RoleResolver,
    activity_log_repository: Arc<dyn ActivityLogRepository>,
    recorder: ActivityRecorder,
}

impl ActivityFeedService {
    /// Creates a feed service from required dependencies.
    #[must_use]
    pub fn new(
        role_resolver: RoleResolver,
        activity_log_repository: Arc<dyn ActivityLogRepository>,
        recorder: ActivityRecorder,
    ) -> Self {
        Self {
            role_resolver,
            activity_log_repository,
            recorder,
        }
    }

    /// Lists the events `viewer` may see for the requested scope.
    ///
    /// Requests beyond the viewer's role are downgraded, not rejected. Paging and counts run
    /// over the viewer's visible rows only.
    pub async fn list_activity(
        &self,
        viewer: &UserIdentity,
        requested_scope: ActivityScope,
        query: ActivityLogQuery,
    ) -> AppResult<ActivityFeed> {
        let viewer_id = viewer.user_id();
        let viewer_role = self.role_resolver.resolve(viewer_id).await;
        let rule = VisibilityRule::for_viewer(viewer_role, viewer_id, requested_scope);
        let page_query = ActivityLogQuery {
            visible_to: Some(rule),
            ..query.clone().clamped(MAX_FEED_PAGE)
        };

        let (records, own, team, all) = tokio::join!(
            self.activity_log_repository.query_events(page_query),
            self.count_scope(&query, viewer_role, viewer_id, ActivityScope::Own),
            self.count_scope(&query, viewer_role, viewer_id, ActivityScope::Team),
            self.count_scope(&query, viewer_role, viewer_id, ActivityScope::All),
        );
        let (events, skipped_rows) = parse_records(records?);

        Ok(ActivityFeed {
            effective_scope: rule.scope,
            events,
            counts: ScopeCounts {
                own: own?.unwrap_or_default(),
                team: team?,
                all: all?,
            },
            skipped_rows,
        })
    }

    async fn count_scope(
        &self,
        query: &ActivityLogQuery,
        viewer_role: Role,
        viewer_id: UserId,
        scope: ActivityScope,
    ) -> AppResult<Option<usize>> {
        if !scope_permitted(viewer_role, scope) {
            return Ok(None);
        }

        let counted = self
            .activity_log_repository
            .count_events(ActivityLogQuery {
                visible_to: Some(VisibilityRule {
                    viewer_id,
                    viewer_role,
                    scope,
                }),
                ..query.clone()
            })
            .await?;

        Ok(Some(counted))
    }

    /// Exports the activity log and records the export.
    pub async fn export_activity(
        &self,
        viewer: &UserIdentity,
        query: ActivityLogQuery,
    ) -> AppResult<ActivityExport> {
        let viewer_role = self.role_resolver.resolve(viewer.user_id()).await;
        PermissionMatrix::require(viewer_role, Capability::ExportAllData)?;

        let records = self
            .activity_log_repository
            .query_events(query.clamped(MAX_EXPORT_ROWS))
            .await?;
        let (events, skipped_rows) = parse_records(records);

        self.recorder
            .record(
                viewer.user_id(),
                RecordActivityInput {
                    action: ActivityAction::DataExported.as_str().to_owned(),
                    entity_type: Some("activity_log".to_owned()),
                    entity_id: None,
                    details: Some(ActivityDetails::DataExported(DataExportedDetails {
                        row_count: events.len() as u64,
                        extra: Map::new(),
                    })),
                    target_user: None,
                },
            )
            .await;

        Ok(ActivityExport {
            events,
            skipped_rows,
        })
    }
}

/// Validates raw rows, skipping and counting the ones that fail.
pub(crate) fn parse_records(records: Vec<ActivityLogRecord>) -> (Vec<ActivityEvent>, usize) {
    let mut events = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        let event_id = record.event_id;
        match ActivityEvent::try_from(record) {
            Ok(event) => events.push(event),
            Err(error) => {
                skipped += 1;
                warn!(event_id = %event_id, error = %error, "skipping malformed activity row");
            }
        }
    }

    (events, skipped)
}
