use std::sync::Arc;

use sqlx::PgPool;
use staffline_infrastructure::{
    InMemoryActivityLogRepository, InMemoryDirectoryRepository, PostgresActivityLogRepository,
    PostgresLoginEventRepository, PostgresProfileRepository, PostgresRoleRepository,
};

use crate::state::Repositories;

pub fn build_postgres_repositories(pool: &PgPool) -> Repositories {
    Repositories {
        roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
        profiles: Arc::new(PostgresProfileRepository::new(pool.clone())),
        activity_log: Arc::new(PostgresActivityLogRepository::new(pool.clone())),
        login_events: Arc::new(PostgresLoginEventRepository::new(pool.clone())),
    }
}

/// Process-local storage; everything is lost on restart.
pub fn build_memory_repositories() -> Repositories {
    let directory = Arc::new(InMemoryDirectoryRepository::new());

    Repositories {
        roles: directory.clone(),
        profiles: directory.clone(),
        activity_log: Arc::new(InMemoryActivityLogRepository::new()),
        login_events: directory,
    }
}
