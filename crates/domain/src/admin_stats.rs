use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use staffline_core::UserId;

use crate::{AccountStatus, ActivityEvent, LoginEvent, Profile, Role, RoleAssignment};

/// Trailing window used for "recent" admin console counters.
pub const RECENT_WINDOW_HOURS: i64 = 24;

/// Account counts by lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    /// Active accounts.
    pub active: usize,
    /// Suspended accounts.
    pub suspended: usize,
    /// Pending accounts.
    pub pending: usize,
}

/// Account counts by effective role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoleCounts {
    /// Accounts resolving to super admin.
    pub super_admin: usize,
    /// Accounts resolving to admin.
    pub admin: usize,
    /// Accounts resolving to user.
    pub user: usize,
    /// Accounts without any role row.
    pub unassigned: usize,
}

/// Counters rendered on the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AdminStats {
    /// Number of accounts in the listing.
    pub total_users: usize,
    /// Accounts by status.
    pub by_status: StatusCounts,
    /// Accounts by effective role.
    pub by_role: RoleCounts,
    /// Accounts provisioned inside the recent window.
    pub new_users_recent: usize,
    /// Successful sign-ins inside the recent window.
    pub successful_logins_recent: usize,
    /// Failed sign-ins inside the recent window.
    pub failed_logins_recent: usize,
    /// Activity events inside the recent window.
    pub activity_recent: usize,
}

/// Aggregates admin console counters.
///
/// Only role rows of listed accounts count. Login and activity events arrive already scoped
/// to the viewer and are counted independently of the user listing.
#[must_use]
pub fn summarize(
    users: &[Profile],
    role_rows: &[RoleAssignment],
    login_events: &[LoginEvent],
    activity_events: &[ActivityEvent],
    now: DateTime<Utc>,
) -> AdminStats {
    let window_start = now - Duration::hours(RECENT_WINDOW_HOURS);
    let is_recent = |at: DateTime<Utc>| at > window_start && at <= now;

    let mut effective_roles: HashMap<UserId, Role> = HashMap::new();
    for row in role_rows {
        effective_roles
            .entry(row.user_id)
            .and_modify(|current| {
                if row.role.priority() < current.priority() {
                    *current = row.role;
                }
            })
            .or_insert(row.role);
    }

    let mut stats = AdminStats {
        total_users: users.len(),
        ..AdminStats::default()
    };

    for profile in users {
        match profile.account_status {
            AccountStatus::Active => stats.by_status.active += 1,
            AccountStatus::Suspended => stats.by_status.suspended += 1,
            AccountStatus::Pending => stats.by_status.pending += 1,
        }

        match effective_roles.get(&profile.user_id) {
            Some(Role::SuperAdmin) => stats.by_role.super_admin += 1,
            Some(Role::Admin) => stats.by_role.admin += 1,
            Some(Role::User) => stats.by_role.user += 1,
            Some(Role::None) | None => stats.by_role.unassigned += 1,
        }

        if is_recent(profile.created_at) {
            stats.new_users_recent += 1;
        }
    }

    for login in login_events.iter().filter(|login| is_recent(login.occurred_at)) {
        if login.succeeded {
            stats.successful_logins_recent += 1;
        } else {
            stats.failed_logins_recent += 1;
        }
    }

    stats.activity_recent = activity_events
        .iter()
        .filter(|event| is_recent(event.created_at()))
        .count();

    stats
}
