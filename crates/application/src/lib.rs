//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod activity_feed_service;
mod activity_recorder;
mod admin_console_service;
mod role_resolver;
mod user_admin_service;

#[cfg(test)]
mod test_fakes;

pub use access_ports::{
    ActivityLogQuery, ActivityLogRepository, LoginEventRepository, ProfileRepository,
    RoleRepository, UserListFilter, load_ancestry,
};
pub use activity_feed_service::{
    ActivityExport, ActivityFeed, ActivityFeedService, MAX_EXPORT_ROWS, MAX_FEED_PAGE,
};
pub use activity_recorder::{ActivityRecorder, RecordActivityInput};
pub use admin_console_service::{
    AdminConsoleService, AdminDataSource, AdminSourceError, AdminSummary,
};
pub use role_resolver::{RoleCache, RoleResolver};
pub use user_admin_service::{ProvisionUserInput, UserAdminService};
