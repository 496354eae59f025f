use std::sync::Arc;

use chrono::{Duration, Utc};
use staffline_core::{AppError, UserId, UserIdentity};
use staffline_domain::{ActivityEvent, LoginEvent, NewActivityEvent, Role};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::test_fakes::{
    FakeActivityLogRepository, FakeLoginEventRepository, FakeProfileRepository,
    FakeRoleRepository, profile,
};
use crate::{RoleCache, RoleResolver};

use super::{AdminConsoleService, AdminDataSource};

struct Agency {
    owner: UserId,
    admin: UserId,
    recruiter: UserId,
    outsider: UserId,
}

impl Agency {
    fn new() -> Self {
        Self {
            owner: UserId::new(),
            admin: UserId::new(),
            recruiter: UserId::new(),
            outsider: UserId::new(),
        }
    }
}

#[derive(Default)]
struct Failures {
    profiles: bool,
    role_listing: bool,
    logins: bool,
    activity: bool,
}

fn event(actor: UserId, role: Role, chain: &[UserId]) -> ActivityEvent {
    let stamped = ActivityEvent::new(
        NewActivityEvent {
            actor,
            action: "vendor.created".to_owned(),
            entity_type: Some("vendor".to_owned()),
            entity_id: None,
            details: None,
            target_user: None,
            performer_role: role,
            created_by_chain: chain.to_vec(),
        },
        Uuid::new_v4(),
        Utc::now() - Duration::minutes(5),
    );
    match stamped {
        Ok(event) => event,
        Err(error) => panic!("invalid test event: {error}"),
    }
}

fn login(user_id: UserId, succeeded: bool) -> LoginEvent {
    LoginEvent {
        user_id,
        occurred_at: Utc::now() - Duration::hours(1),
        succeeded,
    }
}

fn service(agency: &Agency, failures: Failures) -> AdminConsoleService {
    let roles = Arc::new(FakeRoleRepository {
        fail_listing: failures.role_listing,
        ..FakeRoleRepository::with_roles(&[
            (agency.owner, Role::SuperAdmin),
            (agency.admin, Role::Admin),
            (agency.recruiter, Role::User),
            (agency.outsider, Role::Admin),
        ])
    });
    let directory = vec![
        profile(agency.owner, None),
        profile(agency.admin, Some(agency.owner)),
        profile(agency.recruiter, Some(agency.admin)),
        profile(agency.outsider, Some(agency.owner)),
    ];
    let profiles = Arc::new(FakeProfileRepository {
        fail_reads: failures.profiles,
        ..FakeProfileRepository::with_profiles(directory.clone())
    });
    let logins = Arc::new(FakeLoginEventRepository {
        events: vec![
            login(agency.recruiter, true),
            login(agency.recruiter, false),
            login(agency.outsider, true),
        ],
        directory,
        fail: failures.logins,
    });
    let activity = Arc::new(FakeActivityLogRepository {
        events: Mutex::new(vec![
            event(agency.owner, Role::SuperAdmin, &[]),
            event(agency.admin, Role::Admin, &[agency.owner]),
            event(agency.recruiter, Role::User, &[agency.admin, agency.owner]),
            event(agency.outsider, Role::Admin, &[agency.owner]),
        ]),
        fail_queries: failures.activity,
        ..FakeActivityLogRepository::default()
    });

    AdminConsoleService::new(
        RoleResolver::new(roles.clone(), Arc::new(RoleCache::new())),
        roles,
        profiles,
        logins,
        activity,
    )
}

fn identity(user_id: UserId) -> UserIdentity {
    UserIdentity::new(user_id, "Console viewer", None)
}

#[tokio::test]
async fn users_cannot_open_the_admin_console() {
    let agency = Agency::new();
    let service = service(&agency, Failures::default());

    let summary = service.load_summary(&identity(agency.recruiter)).await;

    assert!(matches!(summary, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn super_admin_summary_covers_the_whole_agency() {
    let agency = Agency::new();
    let service = service(&agency, Failures::default());

    let Ok(summary) = service.load_summary(&identity(agency.owner)).await else {
        panic!("summary should load");
    };

    assert!(!summary.is_partial());
    assert_eq!(summary.stats.total_users, 4);
    assert_eq!(summary.stats.by_role.super_admin, 1);
    assert_eq!(summary.stats.by_role.admin, 2);
    assert_eq!(summary.stats.by_role.user, 1);
    assert_eq!(summary.stats.successful_logins_recent, 2);
    assert_eq!(summary.stats.failed_logins_recent, 1);
    assert_eq!(summary.stats.activity_recent, 4);
}

#[tokio::test]
async fn admin_summary_is_scoped_to_their_team() {
    let agency = Agency::new();
    let service = service(&agency, Failures::default());

    let Ok(summary) = service.load_summary(&identity(agency.admin)).await else {
        panic!("summary should load");
    };

    assert_eq!(summary.stats.total_users, 1);
    assert_eq!(summary.stats.by_role.user, 1);
    assert_eq!(summary.stats.successful_logins_recent, 1);
    assert_eq!(summary.stats.failed_logins_recent, 1);
    assert_eq!(summary.stats.activity_recent, 2);
}

#[tokio::test]
async fn failing_source_yields_partial_stats_with_an_error() {
    let agency = Agency::new();
    let service = service(
        &agency,
        Failures {
            logins: true,
            ..Failures::default()
        },
    );

    let Ok(summary) = service.load_summary(&identity(agency.owner)).await else {
        panic!("summary should load");
    };

    assert!(summary.is_partial());
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].source, AdminDataSource::LoginEvents);
    assert_eq!(summary.stats.total_users, 4);
    assert_eq!(summary.stats.successful_logins_recent, 0);
    assert_eq!(summary.stats.activity_recent, 4);
}

#[tokio::test]
async fn every_failing_source_is_reported() {
    let agency = Agency::new();
    let service = service(
        &agency,
        Failures {
            profiles: true,
            role_listing: true,
            logins: false,
            activity: true,
        },
    );

    let Ok(summary) = service.load_summary(&identity(agency.owner)).await else {
        panic!("summary should load");
    };

    let sources: Vec<AdminDataSource> = summary.errors.iter().map(|error| error.source).collect();
    assert_eq!(
        sources,
        vec![
            AdminDataSource::Users,
            AdminDataSource::RoleAssignments,
            AdminDataSource::ActivityEvents,
        ]
    );
    assert_eq!(summary.stats.total_users, 0);
    assert_eq!(summary.stats.activity_recent, 0);
}

#[tokio::test]
async fn login_counters_survive_a_failing_user_listing() {
    let agency = Agency::new();
    let service = service(
        &agency,
        Failures {
            profiles: true,
            ..Failures::default()
        },
    );

    let Ok(owner_view) = service.load_summary(&identity(agency.owner)).await else {
        panic!("summary should load");
    };
    let Ok(admin_view) = service.load_summary(&identity(agency.admin)).await else {
        panic!("summary should load");
    };

    assert_eq!(owner_view.errors.len(), 1);
    assert_eq!(owner_view.errors[0].source, AdminDataSource::Users);
    assert_eq!(owner_view.stats.total_users, 0);
    assert_eq!(owner_view.stats.successful_logins_recent, 2);
    assert_eq!(owner_view.stats.failed_logins_recent, 1);
    assert_eq!(admin_view.stats.successful_logins_recent, 1);
    assert_eq!(admin_view.stats.failed_logins_recent, 1);
}
