use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use staffline_application::{ProfileRepository, UserListFilter};
use staffline_core::{AppError, AppResult, UserId};
use staffline_domain::{AccountStatus, EmailAddress, Profile};

/// PostgreSQL-backed repository for account profiles.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    user_id: uuid::Uuid,
    email: String,
    full_name: String,
    account_status: String,
    created_by: Option<uuid::Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            user_id: UserId::from_uuid(row.user_id),
            email: EmailAddress::new(row.email)?,
            full_name: row.full_name,
            account_status: AccountStatus::from_str(row.account_status.as_str())?,
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, email, full_name, account_status, created_by, created_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find profile '{user_id}': {error}"))
        })?;

        row.map(Profile::try_from).transpose()
    }

    async fn list_profiles(&self, filter: UserListFilter) -> AppResult<Vec<Profile>> {
        // The recursive walk is cycle-safe through the path array.
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            WITH RECURSIVE team AS (
                SELECT user_id, ARRAY[user_id] AS path
                FROM profiles
                WHERE created_by = $1
                UNION ALL
                SELECT child.user_id, team.path || child.user_id
                FROM profiles child
                JOIN team ON child.created_by = team.user_id
                WHERE NOT child.user_id = ANY(team.path)
                    AND child.user_id <> $1
            )
            SELECT user_id, email, full_name, account_status, created_by, created_at
            FROM profiles
            WHERE ($1::UUID IS NULL OR user_id IN (SELECT user_id FROM team))
                AND ($2::TEXT IS NULL OR account_status = $2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(filter.within_team_of.map(|owner| owner.as_uuid()))
        .bind(filter.account_status.map(|status| status.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list profiles: {error}")))?;

        rows.into_iter().map(Profile::try_from).collect()
    }

    async fn create_profile(&self, profile: Profile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id,
                email,
                full_name,
                account_status,
                created_by,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(profile.email.as_str())
        .bind(profile.full_name.as_str())
        .bind(profile.account_status.as_str())
        .bind(profile.created_by.map(|user_id| user_id.as_uuid()))
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| map_profile_conflict(error, &profile))?;

        Ok(())
    }

    async fn delete_profile(&self, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete profile '{user_id}': {error}"))
        })?;

        Ok(())
    }

    async fn update_account_status(
        &self,
        user_id: UserId,
        status: AccountStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET account_status = $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update status of profile '{user_id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "profile '{user_id}' does not exist"
            )));
        }

        Ok(())
    }
}

fn map_profile_conflict(error: sqlx::Error, profile: &Profile) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "an account with email '{}' already exists",
            profile.email.as_str()
        ));
    }

    AppError::Internal(format!(
        "failed to create profile '{}': {error}",
        profile.user_id
    ))
}
