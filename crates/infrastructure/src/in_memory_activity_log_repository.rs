use async_trait::async_trait;
use tokio::sync::RwLock;

use staffline_application::{ActivityLogQuery, ActivityLogRepository};
use staffline_core::AppResult;
use staffline_domain::{ActivityEvent, ActivityLogRecord};

/// In-memory append-only activity log.
///
/// Events are stored as raw records so reads go through the same validation as rows read
/// from PostgreSQL.
#[derive(Debug, Default)]
pub struct InMemoryActivityLogRepository {
    records: RwLock<Vec<ActivityLogRecord>>,
}

impl InMemoryActivityLogRepository {
    /// Creates an empty in-memory activity log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl InMemoryActivityLogRepository {
    async fn matching(&self, query: &ActivityLogQuery) -> Vec<ActivityLogRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| {
                query
                    .action
                    .as_deref()
                    .is_none_or(|action| record.action == action)
                    && query.entity_type.as_deref().is_none_or(|entity_type| {
                        record.entity_type.as_deref() == Some(entity_type)
                    })
                    && query.since.is_none_or(|since| record.created_at > since)
                    && query
                        .visible_to
                        .is_none_or(|rule| rule.admits_record(record))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ActivityLogRepository for InMemoryActivityLogRepository {
    async fn append_event(&self, event: ActivityEvent) -> AppResult<()> {
        let record = ActivityLogRecord::try_from(&event)?;
        self.records.write().await.push(record);
        Ok(())
    }

    async fn query_events(&self, query: ActivityLogQuery) -> AppResult<Vec<ActivityLogRecord>> {
        let mut matching = self.matching(&query).await;
        matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn count_events(&self, query: ActivityLogQuery) -> AppResult<usize> {
        Ok(self.matching(&query).await.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use staffline_application::{ActivityLogQuery, ActivityLogRepository};
    use staffline_core::UserId;
    use staffline_domain::{ActivityEvent, ActivityScope, NewActivityEvent, Role, VisibilityRule};
    use uuid::Uuid;

    use super::InMemoryActivityLogRepository;

    fn event(action: &str, entity_type: &str, minutes_ago: i64) -> ActivityEvent {
        stamped(UserId::new(), Role::Admin, Vec::new(), action, entity_type, minutes_ago)
    }

    fn stamped(
        actor: UserId,
        role: Role,
        chain: Vec<UserId>,
        action: &str,
        entity_type: &str,
        minutes_ago: i64,
    ) -> ActivityEvent {
        match ActivityEvent::new(
            NewActivityEvent {
                actor,
                action: action.to_owned(),
                entity_type: Some(entity_type.to_owned()),
                entity_id: None,
                details: None,
                target_user: None,
                performer_role: role,
                created_by_chain: chain,
            },
            Uuid::new_v4(),
            Utc::now() - Duration::minutes(minutes_ago),
        ) {
            Ok(event) => event,
            Err(error) => panic!("invalid test event: {error}"),
        }
    }

    #[tokio::test]
    async fn query_returns_newest_first_with_filters_and_paging() {
        let repository = InMemoryActivityLogRepository::new();
        for (action, entity_type, minutes_ago) in [
            ("job.created", "job", 30),
            ("job.created", "job", 10),
            ("vendor.created", "vendor", 5),
            ("job.created", "job", 1),
        ] {
            assert!(
                repository
                    .append_event(event(action, entity_type, minutes_ago))
                    .await
                    .is_ok()
            );
        }

        let jobs = repository
            .query_events(ActivityLogQuery {
                action: Some("job.created".to_owned()),
                ..ActivityLogQuery::first_page(10)
            })
            .await;
        let Ok(jobs) = jobs else {
            panic!("query should succeed");
        };
        assert_eq!(jobs.len(), 3);
        assert!(jobs.windows(2).all(|pair| pair[0].created_at >= pair[1].created_at));

        let second_page = repository
            .query_events(ActivityLogQuery {
                offset: 1,
                ..ActivityLogQuery::first_page(2)
            })
            .await;
        assert!(matches!(second_page, Ok(page) if page.len() == 2));

        let vendors_recent = repository
            .query_events(ActivityLogQuery {
                entity_type: Some("vendor".to_owned()),
                since: Some(Utc::now() - Duration::minutes(15)),
                ..ActivityLogQuery::first_page(10)
            })
            .await;
        assert!(matches!(vendors_recent, Ok(page) if page.len() == 1));
    }

    #[tokio::test]
    async fn visibility_rule_applies_before_paging_and_counting() {
        let repository = InMemoryActivityLogRepository::new();
        let owner = UserId::new();
        let admin = UserId::new();
        let recruiter = UserId::new();
        let outsider = UserId::new();
        for event in [
            stamped(owner, Role::SuperAdmin, Vec::new(), "job.created", "job", 1),
            stamped(outsider, Role::Admin, vec![owner], "job.created", "job", 2),
            stamped(outsider, Role::Admin, vec![owner], "job.created", "job", 3),
            stamped(recruiter, Role::User, vec![admin, owner], "job.created", "job", 4),
        ] {
            assert!(repository.append_event(event).await.is_ok());
        }
        let team_view = ActivityLogQuery {
            visible_to: Some(VisibilityRule::for_viewer(Role::Admin, admin, ActivityScope::All)),
            ..ActivityLogQuery::first_page(1)
        };

        let page = repository.query_events(team_view.clone()).await;
        let counted = repository.count_events(team_view).await;

        assert!(matches!(
            page,
            Ok(rows) if rows.len() == 1 && rows[0].actor == recruiter.as_uuid()
        ));
        assert!(matches!(counted, Ok(1)));
        assert!(matches!(
            repository.count_events(ActivityLogQuery::first_page(1)).await,
            Ok(4)
        ));
    }
}
