use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use staffline_application::RoleRepository;
use staffline_core::{AppError, AppResult, UserId};
use staffline_domain::{Role, RoleAssignment};
use tracing::debug;

/// PostgreSQL-backed repository for role rows.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    user_id: uuid::Uuid,
    role: String,
    assigned_by: Option<uuid::Uuid>,
    assigned_at: DateTime<Utc>,
}

impl TryFrom<RoleAssignmentRow> for RoleAssignment {
    type Error = AppError;

    fn try_from(row: RoleAssignmentRow) -> Result<Self, Self::Error> {
        RoleAssignment::new(
            UserId::from_uuid(row.user_id),
            Role::from_str(row.role.as_str())?,
            row.assigned_by.map(UserId::from_uuid),
            row.assigned_at,
        )
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT user_id, role, assigned_by, assigned_at
            FROM role_assignments
            WHERE user_id = $1
            ORDER BY assigned_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load roles for user '{user_id}': {error}"))
        })?;

        rows.into_iter().map(RoleAssignment::try_from).collect()
    }

    async fn list_role_assignments(&self) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT user_id, role, assigned_by, assigned_at
            FROM role_assignments
            ORDER BY assigned_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role assignments: {error}"))
        })?;

        rows.into_iter().map(RoleAssignment::try_from).collect()
    }

    async fn replace_role(&self, assignment: RoleAssignment) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let cleared = sqlx::query(
            r#"
            DELETE FROM role_assignments
            WHERE user_id = $1
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to clear roles for user '{}': {error}",
                assignment.user_id
            ))
        })?;

        sqlx::query(
            r#"
            INSERT INTO role_assignments (user_id, role, assigned_by, assigned_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role.as_str())
        .bind(assignment.assigned_by.map(|user_id| user_id.as_uuid()))
        .bind(assignment.assigned_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to assign role '{}' to user '{}': {error}",
                assignment.role.as_str(),
                assignment.user_id
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        debug!(
            user_id = %assignment.user_id,
            role = assignment.role.as_str(),
            cleared_rows = cleared.rows_affected(),
            "replaced role assignment"
        );

        Ok(())
    }
}
