use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use staffline_application::{ActivityLogQuery, ActivityLogRepository};
use staffline_core::{AppError, AppResult, UserId};
use staffline_domain::{ActivityEvent, ActivityLogRecord, VisibilityRule};

/// PostgreSQL-backed append-only activity log.
#[derive(Clone)]
pub struct PostgresActivityLogRepository {
    pool: PgPool,
}

impl PostgresActivityLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActivityLogRow {
    event_id: uuid::Uuid,
    actor: uuid::Uuid,
    action: String,
    entity_type: Option<String>,
    entity_id: Option<String>,
    details: Option<Value>,
    created_at: DateTime<Utc>,
    visibility_scope: String,
    is_super_admin_activity: bool,
    target_user: Option<uuid::Uuid>,
    performer_role: String,
    created_by_chain: Vec<uuid::Uuid>,
}

impl From<ActivityLogRow> for ActivityLogRecord {
    fn from(row: ActivityLogRow) -> Self {
        Self {
            event_id: row.event_id,
            actor: row.actor,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            details: row.details.unwrap_or(Value::Null),
            created_at: row.created_at,
            visibility_scope: row.visibility_scope,
            is_super_admin_activity: row.is_super_admin_activity,
            target_user: row.target_user,
            performer_role: row.performer_role,
            created_by_chain: row.created_by_chain,
        }
    }
}

#[async_trait]
impl ActivityLogRepository for PostgresActivityLogRepository {
    async fn append_event(&self, event: ActivityEvent) -> AppResult<()> {
        let details = event
            .details()
            .map(|details| details.to_json())
            .transpose()?;
        let created_by_chain: Vec<uuid::Uuid> = event
            .created_by_chain()
            .iter()
            .map(UserId::as_uuid)
            .collect();

        sqlx::query(
            r#"
            INSERT INTO activity_log_entries (
                id,
                actor,
                action,
                entity_type,
                entity_id,
                details,
                created_at,
                visibility_scope,
                is_super_admin_activity,
                target_user,
                performer_role,
                created_by_chain
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(event.id())
        .bind(event.actor().as_uuid())
        .bind(event.action())
        .bind(event.entity_type())
        .bind(event.entity_id())
        .bind(details)
        .bind(event.created_at())
        .bind(event.visibility_scope().as_str())
        .bind(event.is_super_admin_activity())
        .bind(event.target_user().map(|user_id| user_id.as_uuid()))
        .bind(event.performer_role().as_str())
        .bind(created_by_chain)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append activity event: {error}"))
        })?;

        Ok(())
    }

    async fn query_events(&self, query: ActivityLogQuery) -> AppResult<Vec<ActivityLogRecord>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let visibility = VisibilityBinds::from(query.visible_to);

        let rows = sqlx::query_as::<_, ActivityLogRow>(
            r#"
            SELECT
                id AS event_id,
                actor,
                action,
                entity_type,
                entity_id,
                details,
                created_at,
                visibility_scope,
                is_super_admin_activity,
                target_user,
                performer_role,
                created_by_chain
            FROM activity_log_entries
            WHERE ($1::TEXT IS NULL OR action = $1)
                AND ($2::TEXT IS NULL OR entity_type = $2)
                AND ($3::TIMESTAMPTZ IS NULL OR created_at > $3)
                AND (
                    $4::UUID IS NULL
                    OR actor = $4
                    OR (
                        (NOT $6::BOOLEAN OR NOT is_super_admin_activity)
                        AND ($5::TEXT = 'all' OR ($5::TEXT = 'team' AND $4 = ANY(created_by_chain)))
                    )
                )
            ORDER BY created_at DESC
            LIMIT $7
            OFFSET $8
            "#,
        )
        .bind(query.action)
        .bind(query.entity_type)
        .bind(query.since)
        .bind(visibility.viewer)
        .bind(visibility.scope)
        .bind(visibility.hide_super_admin_activity)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list activity log entries: {error}"))
        })?;

        Ok(rows.into_iter().map(ActivityLogRecord::from).collect())
    }

    async fn count_events(&self, query: ActivityLogQuery) -> AppResult<usize> {
        let visibility = VisibilityBinds::from(query.visible_to);

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM activity_log_entries
            WHERE ($1::TEXT IS NULL OR action = $1)
                AND ($2::TEXT IS NULL OR entity_type = $2)
                AND ($3::TIMESTAMPTZ IS NULL OR created_at > $3)
                AND (
                    $4::UUID IS NULL
                    OR actor = $4
                    OR (
                        (NOT $6::BOOLEAN OR NOT is_super_admin_activity)
                        AND ($5::TEXT = 'all' OR ($5::TEXT = 'team' AND $4 = ANY(created_by_chain)))
                    )
                )
            "#,
        )
        .bind(query.action)
        .bind(query.entity_type)
        .bind(query.since)
        .bind(visibility.viewer)
        .bind(visibility.scope)
        .bind(visibility.hide_super_admin_activity)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count activity log entries: {error}"))
        })?;

        usize::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid activity row count: {error}")))
    }
}

/// Bind values of the row-level visibility predicate; all `NULL` when unrestricted.
struct VisibilityBinds {
    viewer: Option<uuid::Uuid>,
    scope: Option<&'static str>,
    hide_super_admin_activity: bool,
}

impl From<Option<VisibilityRule>> for VisibilityBinds {
    fn from(rule: Option<VisibilityRule>) -> Self {
        match rule {
            Some(rule) => Self {
                viewer: Some(rule.viewer_id.as_uuid()),
                scope: Some(rule.scope.as_str()),
                hide_super_admin_activity: rule.hides_super_admin_activity(),
            },
            None => Self {
                viewer: None,
                scope: None,
                hide_super_admin_activity: false,
            },
        }
    }
}
