use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use staffline_application::LoginEventRepository;
use staffline_core::{AppError, AppResult, UserId};
use staffline_domain::LoginEvent;

/// PostgreSQL-backed read model of sign-in attempts.
#[derive(Clone)]
pub struct PostgresLoginEventRepository {
    pool: PgPool,
}

impl PostgresLoginEventRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct LoginEventRow {
    user_id: uuid::Uuid,
    occurred_at: DateTime<Utc>,
    succeeded: bool,
}

#[async_trait]
impl LoginEventRepository for PostgresLoginEventRepository {
    async fn list_login_events_since(
        &self,
        since: DateTime<Utc>,
        within_team_of: Option<UserId>,
    ) -> AppResult<Vec<LoginEvent>> {
        let rows = sqlx::query_as::<_, LoginEventRow>(
            r#"
            WITH RECURSIVE team AS (
                SELECT user_id, ARRAY[user_id] AS path
                FROM profiles
                WHERE created_by = $2
                UNION ALL
                SELECT child.user_id, team.path || child.user_id
                FROM profiles child
                JOIN team ON child.created_by = team.user_id
                WHERE NOT child.user_id = ANY(team.path)
                    AND child.user_id <> $2
            )
            SELECT user_id, occurred_at, succeeded
            FROM login_events
            WHERE occurred_at > $1
                AND ($2::UUID IS NULL OR user_id IN (SELECT user_id FROM team))
            ORDER BY occurred_at DESC
            "#,
        )
        .bind(since)
        .bind(within_team_of.map(|owner| owner.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list login events: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| LoginEvent {
                user_id: UserId::from_uuid(row.user_id),
                occurred_at: row.occurred_at,
                succeeded: row.succeeded,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use staffline_application::{LoginEventRepository, ProfileRepository};
    use staffline_core::UserId;

    use super::PostgresLoginEventRepository;
    use crate::PostgresProfileRepository;
    use crate::test_support::{profile, test_pool};

    #[tokio::test]
    async fn team_scope_limits_logins_to_the_subtree() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let profiles = PostgresProfileRepository::new(pool.clone());
        let repository = PostgresLoginEventRepository::new(pool.clone());

        let owner = UserId::new();
        let admin = UserId::new();
        let recruiter = UserId::new();
        for created in [
            profile(owner, None),
            profile(admin, Some(owner)),
            profile(recruiter, Some(admin)),
        ] {
            assert!(profiles.create_profile(created).await.is_ok());
        }
        for (user_id, succeeded) in [(owner, true), (admin, false), (recruiter, true)] {
            let inserted = sqlx::query(
                r#"
                INSERT INTO login_events (user_id, occurred_at, succeeded)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(user_id.as_uuid())
            .bind(Utc::now() - Duration::minutes(5))
            .bind(succeeded)
            .execute(&pool)
            .await;
            assert!(inserted.is_ok());
        }

        let since = Utc::now() - Duration::hours(1);
        let admin_team = repository.list_login_events_since(since, Some(admin)).await;
        let owner_team = repository.list_login_events_since(since, Some(owner)).await;

        assert!(matches!(
            admin_team,
            Ok(events) if events.len() == 1 && events[0].user_id == recruiter
        ));
        assert!(matches!(owner_team, Ok(events) if events.len() == 2));
    }
}
