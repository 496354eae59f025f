use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use staffline_core::{AppError, UserId};
use staffline_domain::AncestryDepth;
use tracing_subscriber::EnvFilter;

/// Storage adapters backing the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub ancestry_depth: AncestryDepth,
    pub bootstrap_super_admin: Option<UserId>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(migrate_only: bool, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let storage_backend = match optional("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_owned())
            .as_str()
        {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let database_url = optional("DATABASE_URL");
        if (storage_backend == StorageBackend::Postgres || migrate_only) && database_url.is_none()
        {
            return Err(AppError::Validation("DATABASE_URL is required".to_owned()));
        }

        let frontend_url =
            optional("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = optional("API_PORT")
            .map(|value| {
                value
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))
            })
            .transpose()?
            .unwrap_or(3001);

        let max_depth = optional("ACTIVITY_ANCESTRY_MAX_DEPTH")
            .map(|value| match value.parse::<usize>() {
                Ok(depth) if depth > 0 => Ok(depth),
                _ => Err(AppError::Validation(format!(
                    "ACTIVITY_ANCESTRY_MAX_DEPTH must be a positive integer, got '{value}'"
                ))),
            })
            .transpose()?
            .unwrap_or(AncestryDepth::default().limit());
        let ancestry_depth = match optional("ACTIVITY_ANCESTRY_MODE")
            .unwrap_or_else(|| "full".to_owned())
            .as_str()
        {
            "full" => AncestryDepth::Full { max_depth },
            "single_hop" => AncestryDepth::SingleHop,
            other => {
                return Err(AppError::Validation(format!(
                    "ACTIVITY_ANCESTRY_MODE must be either 'full' or 'single_hop', got '{other}'"
                )));
            }
        };

        let bootstrap_super_admin = optional("BOOTSTRAP_SUPER_ADMIN_ID")
            .map(|value| UserId::from_str(value.as_str()))
            .transpose()?;

        Ok(Self {
            migrate_only,
            storage_backend,
            database_url,
            frontend_url,
            api_host,
            api_port,
            ancestry_depth,
            bootstrap_super_admin,
        })
    }

    pub fn require_database_url(&self) -> Result<&str, AppError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
