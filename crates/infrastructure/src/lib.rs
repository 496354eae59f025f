//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_activity_log_repository;
mod in_memory_directory_repository;
mod postgres_activity_log_repository;
mod postgres_login_event_repository;
mod postgres_profile_repository;
mod postgres_role_repository;

#[cfg(test)]
mod test_support;

pub use in_memory_activity_log_repository::InMemoryActivityLogRepository;
pub use in_memory_directory_repository::InMemoryDirectoryRepository;
pub use postgres_activity_log_repository::PostgresActivityLogRepository;
pub use postgres_login_event_repository::PostgresLoginEventRepository;
pub use postgres_profile_repository::PostgresProfileRepository;
pub use postgres_role_repository::PostgresRoleRepository;
