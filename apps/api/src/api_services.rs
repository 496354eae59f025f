mod database;
mod repositories;

pub use database::connect_and_migrate;
pub use repositories::{build_memory_repositories, build_postgres_repositories};
