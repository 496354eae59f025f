//! Staffline API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod bootstrap;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use staffline_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, StorageBackend, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    if config.migrate_only {
        api_services::connect_and_migrate(config.require_database_url()?).await?;
        info!("database migrations applied successfully");
        return Ok(());
    }

    let repositories = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = api_services::connect_and_migrate(config.require_database_url()?).await?;
            api_services::build_postgres_repositories(&pool)
        }
        StorageBackend::Memory => api_services::build_memory_repositories(),
    };

    if let Some(user_id) = config.bootstrap_super_admin {
        bootstrap::ensure_super_admin(&repositories, user_id).await?;
    }

    info!(
        storage_backend = ?config.storage_backend,
        ancestry_depth = ?config.ancestry_depth,
        "staffline-api configured"
    );

    let app_state = AppState::new(repositories, config.ancestry_depth);
    let app = api_router::build_router(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "staffline-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
