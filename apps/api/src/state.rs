use std::sync::Arc;

use staffline_application::{
    ActivityFeedService, ActivityLogRepository, ActivityRecorder, AdminConsoleService,
    LoginEventRepository, ProfileRepository, RoleCache, RoleRepository, RoleResolver,
    UserAdminService,
};
use staffline_domain::AncestryDepth;

/// Storage ports shared by every request.
#[derive(Clone)]
pub struct Repositories {
    pub roles: Arc<dyn RoleRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub activity_log: Arc<dyn ActivityLogRepository>,
    pub login_events: Arc<dyn LoginEventRepository>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub repositories: Repositories,
    pub ancestry_depth: AncestryDepth,
}

/// Services bound to one request-scoped role cache.
#[derive(Clone)]
pub struct SessionServices {
    pub role_resolver: RoleResolver,
    pub activity_feed_service: ActivityFeedService,
    pub admin_console_service: AdminConsoleService,
    pub user_admin_service: UserAdminService,
}

impl AppState {
    pub fn new(repositories: Repositories, ancestry_depth: AncestryDepth) -> Self {
        Self {
            repositories,
            ancestry_depth,
        }
    }

    /// Builds the services for one request. Role lookups are cached for the request only.
    pub fn session(&self) -> SessionServices {
        let repositories = &self.repositories;
        let role_resolver =
            RoleResolver::new(repositories.roles.clone(), Arc::new(RoleCache::new()));
        let recorder = ActivityRecorder::new(
            role_resolver.clone(),
            repositories.profiles.clone(),
            repositories.activity_log.clone(),
            self.ancestry_depth,
        );

        SessionServices {
            activity_feed_service: ActivityFeedService::new(
                role_resolver.clone(),
                repositories.activity_log.clone(),
                recorder.clone(),
            ),
            admin_console_service: AdminConsoleService::new(
                role_resolver.clone(),
                repositories.roles.clone(),
                repositories.profiles.clone(),
                repositories.login_events.clone(),
                repositories.activity_log.clone(),
            ),
            user_admin_service: UserAdminService::new(
                role_resolver.clone(),
                repositories.roles.clone(),
                repositories.profiles.clone(),
                recorder,
            ),
            role_resolver,
        }
    }
}
