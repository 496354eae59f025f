use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use staffline_core::UserId;
use staffline_domain::{AccountStatus, EmailAddress, Profile};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and applies migrations, or returns `None` when it is unset.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres adapter tests: {error}");
    }

    Some(pool)
}

pub(crate) fn profile_at(
    user_id: UserId,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
) -> Profile {
    let email = match EmailAddress::new(format!("{user_id}@agency.test")) {
        Ok(email) => email,
        Err(error) => panic!("invalid test email: {error}"),
    };

    Profile {
        user_id,
        email,
        full_name: format!("Account {user_id}"),
        account_status: AccountStatus::Active,
        created_by,
        created_at,
    }
}

pub(crate) fn profile(user_id: UserId, created_by: Option<UserId>) -> Profile {
    profile_at(user_id, created_by, Utc::now())
}
