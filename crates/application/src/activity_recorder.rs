use std::sync::Arc;

use chrono::Utc;
use staffline_core::{AppResult, UserId};
use staffline_domain::{ActivityDetails, ActivityEvent, AncestryDepth, NewActivityEvent};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{ActivityLogRepository, ProfileRepository, RoleResolver, load_ancestry};

/// Input payload for one audit event.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordActivityInput {
    /// Action label, such as `consultant.updated`.
    pub action: String,
    /// Optional entity type label.
    pub entity_type: Option<String>,
    /// Optional entity identifier.
    pub entity_id: Option<String>,
    /// Optional payload.
    pub details: Option<ActivityDetails>,
    /// Account the action was aimed at.
    pub target_user: Option<UserId>,
}

impl RecordActivityInput {
    /// Creates an input with only an action label.
    #[must_use]
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            entity_type: None,
            entity_id: None,
            details: None,
            target_user: None,
        }
    }
}

/// Best-effort writer of self-describing audit events.
///
/// Every event carries the actor's role and created-by ancestry as of write time, so reads
/// never need a fresh lookup. Failures are logged and swallowed.
#[derive(Clone)]
pub struct ActivityRecorder {
    role_resolver: RoleResolver,
    profile_repository: Arc<dyn ProfileRepository>,
    activity_log_repository: Arc<dyn ActivityLogRepository>,
    ancestry_depth: AncestryDepth,
}

impl ActivityRecorder {
    /// Creates a recorder from required dependencies.
    #[must_use]
    pub fn new(
        role_resolver: RoleResolver,
        profile_repository: Arc<dyn ProfileRepository>,
        activity_log_repository: Arc<dyn ActivityLogRepository>,
        ancestry_depth: AncestryDepth,
    ) -> Self {
        Self {
            role_resolver,
            profile_repository,
            activity_log_repository,
            ancestry_depth,
        }
    }

    /// Appends one event for `actor`. Never fails.
    pub async fn record(&self, actor: UserId, input: RecordActivityInput) {
        let action = input.action.clone();
        if let Err(error) = self.try_record(actor, input).await {
            warn!(
                actor = %actor,
                action = %action,
                error = %error,
                "failed to record activity event"
            );
        }
    }

    async fn try_record(&self, actor: UserId, input: RecordActivityInput) -> AppResult<()> {
        let performer_role = self.role_resolver.resolve(actor).await;
        let created_by_chain =
            match load_ancestry(self.profile_repository.as_ref(), actor, self.ancestry_depth)
                .await
            {
                Ok(chain) => chain,
                Err(error) => {
                    warn!(
                        actor = %actor,
                        error = %error,
                        "failed to resolve actor ancestry, recording without it"
                    );
                    Vec::new()
                }
            };

        let event = ActivityEvent::new(
            NewActivityEvent {
                actor,
                action: input.action,
                entity_type: input.entity_type,
                entity_id: input.entity_id,
                details: input.details,
                target_user: input.target_user,
                performer_role,
                created_by_chain,
            },
            Uuid::new_v4(),
            Utc::now(),
        )?;

        debug!(
            actor = %actor,
            event_id = %event.id(),
            action = %event.action(),
            visibility = event.visibility_scope().as_str(),
            "recording activity event"
        );

        self.activity_log_repository.append_event(event).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use staffline_core::UserId;
    use staffline_domain::{AncestryDepth, Role, VisibilityScope};

    use crate::test_fakes::{
        FakeActivityLogRepository, FakeProfileRepository, FakeRoleRepository, profile,
    };
    use crate::{RoleCache, RoleResolver};

    use super::{ActivityRecorder, RecordActivityInput};

    struct Fixture {
        owner: UserId,
        admin: UserId,
        recruiter: UserId,
        roles: Arc<FakeRoleRepository>,
        profiles: Arc<FakeProfileRepository>,
    }

    fn fixture() -> Fixture {
        let owner = UserId::new();
        let admin = UserId::new();
        let recruiter = UserId::new();

        Fixture {
            owner,
            admin,
            recruiter,
            roles: Arc::new(FakeRoleRepository::with_roles(&[
                (owner, Role::SuperAdmin),
                (admin, Role::Admin),
                (recruiter, Role::User),
            ])),
            profiles: Arc::new(FakeProfileRepository::with_profiles(vec![
                profile(owner, None),
                profile(admin, Some(owner)),
                profile(recruiter, Some(admin)),
            ])),
        }
    }

    fn recorder(
        fixture: &Fixture,
        log: Arc<FakeActivityLogRepository>,
        depth: AncestryDepth,
    ) -> ActivityRecorder {
        ActivityRecorder::new(
            RoleResolver::new(fixture.roles.clone(), Arc::new(RoleCache::new())),
            fixture.profiles.clone(),
            log,
            depth,
        )
    }

    #[tokio::test]
    async fn record_stamps_role_and_full_ancestry() {
        let fixture = fixture();
        let log = Arc::new(FakeActivityLogRepository::default());
        let recorder = recorder(&fixture, log.clone(), AncestryDepth::default());

        recorder
            .record(fixture.recruiter, RecordActivityInput::action("consultant.updated"))
            .await;

        let events = log.stored().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].performer_role(), Role::User);
        assert_eq!(events[0].visibility_scope(), VisibilityScope::Team);
        assert_eq!(events[0].created_by_chain(), &[fixture.admin, fixture.owner]);
    }

    #[tokio::test]
    async fn single_hop_policy_captures_only_the_immediate_creator() {
        let fixture = fixture();
        let log = Arc::new(FakeActivityLogRepository::default());
        let recorder = recorder(&fixture, log.clone(), AncestryDepth::SingleHop);

        recorder
            .record(fixture.recruiter, RecordActivityInput::action("job.created"))
            .await;

        let events = log.stored().await;
        assert_eq!(events[0].created_by_chain(), &[fixture.admin]);
    }

    #[tokio::test]
    async fn super_admin_events_are_flagged_global() {
        let fixture = fixture();
        let log = Arc::new(FakeActivityLogRepository::default());
        let recorder = recorder(&fixture, log.clone(), AncestryDepth::default());

        recorder
            .record(fixture.owner, RecordActivityInput::action("billing.plan_changed"))
            .await;

        let events = log.stored().await;
        assert!(events[0].is_super_admin_activity());
        assert_eq!(events[0].visibility_scope(), VisibilityScope::Global);
        assert!(events[0].created_by_chain().is_empty());
    }

    #[tokio::test]
    async fn insert_failure_is_swallowed() {
        let fixture = fixture();
        let log = Arc::new(FakeActivityLogRepository::failing_appends());
        let recorder = recorder(&fixture, log.clone(), AncestryDepth::default());

        recorder
            .record(fixture.admin, RecordActivityInput::action("vendor.created"))
            .await;

        assert!(log.stored().await.is_empty());
    }

    #[tokio::test]
    async fn profile_failure_still_records_without_ancestry() {
        let fixture = fixture();
        let failing_profiles = Arc::new(FakeProfileRepository {
            fail_reads: true,
            ..FakeProfileRepository::default()
        });
        let log = Arc::new(FakeActivityLogRepository::default());
        let recorder = ActivityRecorder::new(
            RoleResolver::new(fixture.roles.clone(), Arc::new(RoleCache::new())),
            failing_profiles,
            log.clone(),
            AncestryDepth::default(),
        );

        recorder
            .record(fixture.recruiter, RecordActivityInput::action("job.created"))
            .await;

        let events = log.stored().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].created_by_chain().is_empty());
    }

    #[tokio::test]
    async fn blank_action_is_dropped_not_raised() {
        let fixture = fixture();
        let log = Arc::new(FakeActivityLogRepository::default());
        let recorder = recorder(&fixture, log.clone(), AncestryDepth::default());

        recorder
            .record(fixture.admin, RecordActivityInput::action(" "))
            .await;

        assert!(log.stored().await.is_empty());
    }
}
