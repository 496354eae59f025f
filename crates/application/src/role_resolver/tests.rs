use std::sync::Arc;
use std::time::Duration;

use staffline_core::UserId;
use staffline_domain::Role;

use crate::test_fakes::{FakeRoleRepository, role_row};

use super::{RoleCache, RoleResolver};

fn resolver(repository: Arc<FakeRoleRepository>) -> RoleResolver {
    RoleResolver::new(repository, Arc::new(RoleCache::new()))
}

#[tokio::test]
async fn resolve_twice_hits_the_backend_once() {
    let user_id = UserId::new();
    let repository = Arc::new(FakeRoleRepository::with_roles(&[(user_id, Role::Admin)]));
    let resolver = resolver(repository.clone());

    let first = resolver.resolve(user_id).await;
    let second = resolver.resolve(user_id).await;

    assert_eq!(first, Role::Admin);
    assert_eq!(second, Role::Admin);
    assert_eq!(repository.lookup_count(), 1);
}

#[tokio::test]
async fn concurrent_resolves_are_coalesced() {
    let user_id = UserId::new();
    let repository = Arc::new(FakeRoleRepository {
        lookup_delay: Some(Duration::from_millis(25)),
        ..FakeRoleRepository::with_roles(&[(user_id, Role::SuperAdmin)])
    });
    let resolver = resolver(repository.clone());

    let (first, second, third) = tokio::join!(
        resolver.resolve(user_id),
        resolver.resolve(user_id),
        resolver.resolve(user_id)
    );

    assert_eq!(first, Role::SuperAdmin);
    assert_eq!(second, Role::SuperAdmin);
    assert_eq!(third, Role::SuperAdmin);
    assert_eq!(repository.lookup_count(), 1);
}

#[tokio::test]
async fn duplicate_rows_resolve_to_the_most_privileged_role() {
    let user_id = UserId::new();
    let repository = Arc::new(FakeRoleRepository::with_roles(&[
        (user_id, Role::Admin),
        (user_id, Role::SuperAdmin),
    ]));

    assert_eq!(resolver(repository).resolve(user_id).await, Role::SuperAdmin);
}

#[tokio::test]
async fn missing_rows_default_to_user() {
    let repository = Arc::new(FakeRoleRepository::default());
    let resolver = resolver(repository.clone());
    let user_id = UserId::new();

    assert_eq!(resolver.resolve(user_id).await, Role::User);
    assert_eq!(resolver.resolve(user_id).await, Role::User);
    assert_eq!(repository.lookup_count(), 1);
}

#[tokio::test]
async fn lookup_failure_fails_closed_and_is_not_cached() {
    let user_id = UserId::new();
    let repository = Arc::new(FakeRoleRepository {
        fail_lookups: true,
        ..FakeRoleRepository::with_roles(&[(user_id, Role::SuperAdmin)])
    });
    let cache = Arc::new(RoleCache::new());
    let resolver = RoleResolver::new(repository.clone(), cache.clone());

    assert_eq!(resolver.resolve(user_id).await, Role::User);
    assert_eq!(cache.cached(user_id).await, None);
    assert_eq!(resolver.resolve(user_id).await, Role::User);
    assert_eq!(repository.lookup_count(), 2);
}

#[tokio::test]
async fn refetch_overwrites_the_cached_role() {
    let user_id = UserId::new();
    let repository = Arc::new(FakeRoleRepository::with_roles(&[(user_id, Role::User)]));
    let cache = Arc::new(RoleCache::new());
    let resolver = RoleResolver::new(repository.clone(), cache.clone());

    assert_eq!(resolver.resolve(user_id).await, Role::User);

    {
        let mut rows = repository.rows.lock().await;
        rows.clear();
        rows.push(role_row(user_id, Role::Admin));
    }

    assert_eq!(resolver.resolve(user_id).await, Role::User);
    assert_eq!(resolver.refetch(user_id).await, Role::Admin);
    assert_eq!(cache.cached(user_id).await, Some(Role::Admin));
    assert_eq!(resolver.resolve(user_id).await, Role::Admin);
    assert_eq!(repository.lookup_count(), 2);
}

#[tokio::test]
async fn anonymous_viewer_resolves_to_none_without_lookup() {
    let repository = Arc::new(FakeRoleRepository::default());
    let resolver = resolver(repository.clone());

    assert_eq!(resolver.resolve_viewer(None).await, Role::None);
    assert_eq!(repository.lookup_count(), 0);
}

#[tokio::test]
async fn separate_sessions_do_not_share_cached_roles() {
    let user_id = UserId::new();
    let repository = Arc::new(FakeRoleRepository::with_roles(&[(user_id, Role::Admin)]));
    let first_session = resolver(repository.clone());
    let second_session = resolver(repository.clone());

    first_session.resolve(user_id).await;
    second_session.resolve(user_id).await;

    assert_eq!(repository.lookup_count(), 2);
}
