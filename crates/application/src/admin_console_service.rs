use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use staffline_core::{AppResult, UserIdentity};
use staffline_domain::{
    AdminStats, Capability, PermissionMatrix, RECENT_WINDOW_HOURS, VisibilityRule, summarize,
    widest_scope,
};
use tracing::warn;

use crate::activity_feed_service::{MAX_EXPORT_ROWS, parse_records};
use crate::{
    ActivityLogQuery, ActivityLogRepository, LoginEventRepository, ProfileRepository,
    RoleRepository, RoleResolver, UserListFilter,
};

/// Backend source feeding the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminDataSource {
    /// Account profiles.
    Users,
    /// Role rows.
    RoleAssignments,
    /// Sign-in history.
    LoginEvents,
    /// Activity log.
    ActivityEvents,
}

impl AdminDataSource {
    /// Returns a stable transport value for this source.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::RoleAssignments => "role_assignments",
            Self::LoginEvents => "login_events",
            Self::ActivityEvents => "activity_events",
        }
    }
}

/// Failure of one source while loading the admin console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSourceError {
    /// Source that failed.
    pub source: AdminDataSource,
    /// Error message.
    pub message: String,
}

/// Admin console counters plus the sources that could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSummary {
    /// Counters over the data that loaded.
    pub stats: AdminStats,
    /// Sources that failed; their counters are computed over no data.
    pub errors: Vec<AdminSourceError>,
    /// Activity rows that failed validation.
    pub skipped_activity_rows: usize,
    /// Reference time of the trailing window.
    pub generated_at: DateTime<Utc>,
}

impl AdminSummary {
    /// Returns whether any source failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Composes the admin console from its backend sources.
#[derive(Clone)]
pub struct AdminConsoleService {
    role_resolver: RoleResolver,
    role_repository: Arc<dyn RoleRepository>,
    profile_repository: Arc<dyn ProfileRepository>,
    login_event_repository: Arc<dyn LoginEventRepository>,
    activity_log_repository: Arc<dyn ActivityLogRepository>,
}

impl AdminConsoleService {
    /// Creates an admin console service from required dependencies.
    #[must_use]
    pub fn new(
        role_resolver: RoleResolver,
        role_repository: Arc<dyn RoleRepository>,
        profile_repository: Arc<dyn ProfileRepository>,
        login_event_repository: Arc<dyn LoginEventRepository>,
        activity_log_repository: Arc<dyn ActivityLogRepository>,
    ) -> Self {
        Self {
            role_resolver,
            role_repository,
            profile_repository,
            login_event_repository,
            activity_log_repository,
        }
    }

    /// Loads admin console counters for `viewer`.
    ///
    /// Sources are fetched concurrently and each is scoped to the viewer's team on its own. A
    /// failing source is reported in [`AdminSummary::errors`] while the others still count.
    pub async fn load_summary(&self, viewer: &UserIdentity) -> AppResult<AdminSummary> {
        let viewer_id = viewer.user_id();
        let viewer_role = self.role_resolver.resolve(viewer_id).await;
        PermissionMatrix::require(viewer_role, Capability::ViewAdminPanel)?;

        let now = Utc::now();
        let window_start = now - Duration::hours(RECENT_WINDOW_HOURS);
        let team_of = (!PermissionMatrix::has(viewer_role, Capability::ViewAllUsers))
            .then_some(viewer_id);
        let user_filter = UserListFilter {
            within_team_of: team_of,
            ..UserListFilter::default()
        };
        let activity_query = ActivityLogQuery {
            since: Some(window_start),
            visible_to: Some(VisibilityRule::for_viewer(
                viewer_role,
                viewer_id,
                widest_scope(viewer_role),
            )),
            ..ActivityLogQuery::first_page(MAX_EXPORT_ROWS)
        };

        let (users, role_rows, login_events, activity_records) = tokio::join!(
            self.profile_repository.list_profiles(user_filter),
            self.role_repository.list_role_assignments(),
            self.login_event_repository
                .list_login_events_since(window_start, team_of),
            self.activity_log_repository.query_events(activity_query),
        );

        let mut errors = Vec::new();
        let users = collect_source(AdminDataSource::Users, users, &mut errors);
        let role_rows = collect_source(AdminDataSource::RoleAssignments, role_rows, &mut errors);
        let login_events = collect_source(AdminDataSource::LoginEvents, login_events, &mut errors);
        let activity_records = collect_source(
            AdminDataSource::ActivityEvents,
            activity_records,
            &mut errors,
        );

        let (activity_events, skipped_activity_rows) = parse_records(activity_records);

        Ok(AdminSummary {
            stats: summarize(&users, &role_rows, &login_events, &activity_events, now),
            errors,
            skipped_activity_rows,
            generated_at: now,
        })
    }
}

fn collect_source<T>(
    source: AdminDataSource,
    result: AppResult<Vec<T>>,
    errors: &mut Vec<AdminSourceError>,
) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(error) => {
            warn!(source = source.as_str(), error = %error, "admin console source failed");
            errors.push(AdminSourceError {
                source,
                message: error.to_string(),
            });
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests;
