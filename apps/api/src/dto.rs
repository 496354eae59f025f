use serde::{Deserialize, Serialize};
use serde_json::Value;
use staffline_application::{ActivityExport, ActivityFeed, AdminSourceError, AdminSummary};
use staffline_core::UserIdentity;
use staffline_domain::{ActivityEvent, Capability, Profile, Role, ScopeCounts};
use tracing::warn;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of the calling account and its effective access.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/me-response.ts"
)]
pub struct MeResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: String,
    pub capabilities: Vec<String>,
}

impl MeResponse {
    pub fn new(identity: &UserIdentity, role: Role, capabilities: &[Capability]) -> Self {
        Self {
            user_id: identity.user_id().to_string(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(str::to_owned),
            role: role.as_str().to_owned(),
            capabilities: capabilities
                .iter()
                .map(|capability| capability.as_str().to_owned())
                .collect(),
        }
    }
}

/// API representation of one activity event.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-event-response.ts"
)]
pub struct ActivityEventResponse {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub details: Value,
    pub created_at: String,
    pub target_user: Option<String>,
    pub performer_role: String,
    pub visibility_scope: String,
    pub is_super_admin_activity: bool,
    pub created_by_chain: Vec<String>,
}

impl From<&ActivityEvent> for ActivityEventResponse {
    fn from(event: &ActivityEvent) -> Self {
        Self {
            id: event.id().to_string(),
            actor: event.actor().to_string(),
            action: event.action().to_owned(),
            entity_type: event.entity_type().map(str::to_owned),
            entity_id: event.entity_id().map(str::to_owned),
            details: details_json(event),
            created_at: event.created_at().to_rfc3339(),
            target_user: event.target_user().map(|user_id| user_id.to_string()),
            performer_role: event.performer_role().as_str().to_owned(),
            visibility_scope: event.visibility_scope().as_str().to_owned(),
            is_super_admin_activity: event.is_super_admin_activity(),
            created_by_chain: event
                .created_by_chain()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

fn details_json(event: &ActivityEvent) -> Value {
    let Some(details) = event.details() else {
        return Value::Null;
    };

    details.to_json().unwrap_or_else(|error| {
        warn!(event_id = %event.id(), error = %error, "dropping unserializable activity details");
        Value::Null
    })
}

/// Per-scope event counts; `null` for scopes the viewer may not request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/scope-counts-response.ts"
)]
pub struct ScopeCountsResponse {
    #[serde(rename = "self")]
    pub own: usize,
    pub team: Option<usize>,
    pub all: Option<usize>,
}

impl From<ScopeCounts> for ScopeCountsResponse {
    fn from(counts: ScopeCounts) -> Self {
        Self {
            own: counts.own,
            team: counts.team,
            all: counts.all,
        }
    }
}

/// One page of the activity feed.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-feed-response.ts"
)]
pub struct ActivityFeedResponse {
    pub effective_scope: String,
    pub events: Vec<ActivityEventResponse>,
    pub counts: ScopeCountsResponse,
    pub skipped_rows: usize,
}

impl From<ActivityFeed> for ActivityFeedResponse {
    fn from(feed: ActivityFeed) -> Self {
        Self {
            effective_scope: feed.effective_scope.as_str().to_owned(),
            events: feed.events.iter().map(ActivityEventResponse::from).collect(),
            counts: ScopeCountsResponse::from(feed.counts),
            skipped_rows: feed.skipped_rows,
        }
    }
}

/// Full activity export.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-export-response.ts"
)]
pub struct ActivityExportResponse {
    pub events: Vec<ActivityEventResponse>,
    pub skipped_rows: usize,
}

impl From<ActivityExport> for ActivityExportResponse {
    fn from(export: ActivityExport) -> Self {
        Self {
            events: export
                .events
                .iter()
                .map(ActivityEventResponse::from)
                .collect(),
            skipped_rows: export.skipped_rows,
        }
    }
}

/// Account counts by status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/status-counts-response.ts"
)]
pub struct StatusCountsResponse {
    pub active: usize,
    pub suspended: usize,
    pub pending: usize,
}

/// Account counts by effective role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-counts-response.ts"
)]
pub struct RoleCountsResponse {
    pub super_admin: usize,
    pub admin: usize,
    pub user: usize,
    pub unassigned: usize,
}

/// Source that failed while loading the admin console.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/admin-source-error-response.ts"
)]
pub struct AdminSourceErrorResponse {
    pub source: String,
    pub message: String,
}

impl From<AdminSourceError> for AdminSourceErrorResponse {
    // Backend details are already logged by the console service.
    fn from(error: AdminSourceError) -> Self {
        let source = error.source.as_str();

        Self {
            source: source.to_owned(),
            message: format!("{source} could not be loaded"),
        }
    }
}

/// Admin console counters.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/admin-summary-response.ts"
)]
pub struct AdminSummaryResponse {
    pub total_users: usize,
    pub by_status: StatusCountsResponse,
    pub by_role: RoleCountsResponse,
    pub new_users_recent: usize,
    pub successful_logins_recent: usize,
    pub failed_logins_recent: usize,
    pub activity_recent: usize,
    pub skipped_activity_rows: usize,
    pub is_partial: bool,
    pub errors: Vec<AdminSourceErrorResponse>,
    pub generated_at: String,
}

impl From<AdminSummary> for AdminSummaryResponse {
    fn from(summary: AdminSummary) -> Self {
        let is_partial = summary.is_partial();
        let stats = summary.stats;

        Self {
            total_users: stats.total_users,
            by_status: StatusCountsResponse {
                active: stats.by_status.active,
                suspended: stats.by_status.suspended,
                pending: stats.by_status.pending,
            },
            by_role: RoleCountsResponse {
                super_admin: stats.by_role.super_admin,
                admin: stats.by_role.admin,
                user: stats.by_role.user,
                unassigned: stats.by_role.unassigned,
            },
            new_users_recent: stats.new_users_recent,
            successful_logins_recent: stats.successful_logins_recent,
            failed_logins_recent: stats.failed_logins_recent,
            activity_recent: stats.activity_recent,
            skipped_activity_rows: summary.skipped_activity_rows,
            is_partial,
            errors: summary
                .errors
                .into_iter()
                .map(AdminSourceErrorResponse::from)
                .collect(),
            generated_at: summary.generated_at.to_rfc3339(),
        }
    }
}

/// Incoming payload for account provisioning.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/provision-user-request.ts"
)]
pub struct ProvisionUserRequest {
    pub email: String,
    pub full_name: String,
    pub role: String,
}

/// Incoming payload for role changes.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-role-request.ts"
)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// Incoming payload for account status changes.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-status-request.ts"
)]
pub struct ChangeStatusRequest {
    pub status: String,
}

/// API representation of an account profile.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/profile-response.ts"
)]
pub struct ProfileResponse {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub account_status: String,
    pub created_by: Option<String>,
    pub created_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            email: profile.email.as_str().to_owned(),
            full_name: profile.full_name,
            account_status: profile.account_status.as_str().to_owned(),
            created_by: profile.created_by.map(|user_id| user_id.to_string()),
            created_at: profile.created_at.to_rfc3339(),
        }
    }
}

/// Effective role of an account after a change.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub user_id: String,
    pub role: String,
}
