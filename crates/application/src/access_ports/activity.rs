use async_trait::async_trait;
use chrono::{DateTime, Utc};

use staffline_core::AppResult;
use staffline_domain::{ActivityEvent, ActivityLogRecord, VisibilityRule};

/// Query parameters for activity log reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Optional action filter.
    pub action: Option<String>,
    /// Optional entity type filter.
    pub entity_type: Option<String>,
    /// Optional lower bound on the event timestamp (exclusive).
    pub since: Option<DateTime<Utc>>,
    /// Rows the viewer may not see are dropped before paging.
    pub visible_to: Option<VisibilityRule>,
}

impl ActivityLogQuery {
    /// Returns a first page of `limit` rows without filters.
    #[must_use]
    pub fn first_page(limit: usize) -> Self {
        Self {
            limit,
            offset: 0,
            action: None,
            entity_type: None,
            since: None,
            visible_to: None,
        }
    }

    /// Caps the page size to `1..=max_limit` and the offset to 5000.
    #[must_use]
    pub fn clamped(self, max_limit: usize) -> Self {
        Self {
            limit: self.limit.clamp(1, max_limit),
            offset: self.offset.min(5_000),
            ..self
        }
    }
}

/// Append-only port for activity events.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Persists one event.
    async fn append_event(&self, event: ActivityEvent) -> AppResult<()>;

    /// Lists raw rows, newest first. Rows are validated by the caller.
    async fn query_events(&self, query: ActivityLogQuery) -> AppResult<Vec<ActivityLogRecord>>;

    /// Counts rows matching the query filters, ignoring `limit` and `offset`.
    async fn count_events(&self, query: ActivityLogQuery) -> AppResult<usize>;
}
