//! Domain entities and invariants of the Staffline access-control core.

#![forbid(unsafe_code)]

mod activity;
mod activity_visibility;
mod admin_stats;
mod profile;
mod role;
mod security;

pub use activity::{
    ActivityAction, ActivityDetails, ActivityEvent, ActivityLogRecord, ActivityScope,
    DataExportedDetails, NewActivityEvent, RoleChangedDetails, StatusChangedDetails,
    UserProvisionedDetails, VisibilityScope,
};
pub use activity_visibility::{
    ActivityVisibility, ScopeCounts, VisibilityRule, effective_scope, filter_activity,
    is_visible, scope_counts, scope_permitted, widest_scope,
};
pub use admin_stats::{AdminStats, RECENT_WINDOW_HOURS, RoleCounts, StatusCounts, summarize};
pub use profile::{
    AccountStatus, AncestryDepth, EmailAddress, LoginEvent, OwnershipTree, Profile,
};
pub use role::{Role, RoleAssignment};
pub use security::{Capability, PermissionMatrix, PermissionSet};
