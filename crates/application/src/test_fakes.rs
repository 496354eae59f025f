use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use staffline_core::{AppError, AppResult, UserId};
use staffline_domain::{
    AccountStatus, ActivityEvent, ActivityLogRecord, EmailAddress, LoginEvent, OwnershipTree,
    Profile, Role, RoleAssignment,
};

use crate::{
    ActivityLogQuery, ActivityLogRepository, LoginEventRepository, ProfileRepository,
    RoleRepository, UserListFilter,
};

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    pub rows: Mutex<Vec<RoleAssignment>>,
    pub lookups: AtomicUsize,
    pub replacements: AtomicUsize,
    pub fail_lookups: bool,
    pub fail_listing: bool,
    pub fail_replacements: bool,
    pub lookup_delay: Option<Duration>,
}

impl FakeRoleRepository {
    pub fn with_roles(roles: &[(UserId, Role)]) -> Self {
        Self {
            rows: Mutex::new(
                roles
                    .iter()
                    .map(|(user_id, role)| role_row(*user_id, *role))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

pub(crate) fn role_row(user_id: UserId, role: Role) -> RoleAssignment {
    RoleAssignment {
        user_id,
        role,
        assigned_by: None,
        assigned_at: Utc::now(),
    }
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lookups {
            return Err(AppError::Internal("role backend unavailable".to_owned()));
        }

        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_role_assignments(&self) -> AppResult<Vec<RoleAssignment>> {
        if self.fail_listing {
            return Err(AppError::Internal("role listing unavailable".to_owned()));
        }
        Ok(self.rows.lock().await.clone())
    }

    async fn replace_role(&self, assignment: RoleAssignment) -> AppResult<()> {
        self.replacements.fetch_add(1, Ordering::SeqCst);
        if self.fail_replacements {
            return Err(AppError::Internal("role insert rejected".to_owned()));
        }
        let mut rows = self.rows.lock().await;
        rows.retain(|row| row.user_id != assignment.user_id);
        rows.push(assignment);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeProfileRepository {
    pub profiles: Mutex<HashMap<UserId, Profile>>,
    pub fail_reads: bool,
}

pub(crate) fn profile(user_id: UserId, created_by: Option<UserId>) -> Profile {
    Profile {
        user_id,
        email: match EmailAddress::new(format!("{user_id}@agency.test")) {
            Ok(email) => email,
            Err(error) => panic!("invalid test email: {error}"),
        },
        full_name: format!("Account {user_id}"),
        account_status: AccountStatus::Active,
        created_by,
        created_at: Utc::now(),
    }
}

impl FakeProfileRepository {
    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: Mutex::new(
                profiles
                    .into_iter()
                    .map(|profile| (profile.user_id, profile))
                    .collect(),
            ),
            fail_reads: false,
        }
    }

    async fn is_below(&self, member: UserId, owner: UserId) -> bool {
        let profiles = self.profiles.lock().await;
        let mut current = member;
        for _ in 0..profiles.len() {
            match profiles.get(&current).and_then(|profile| profile.created_by) {
                Some(parent) if parent == owner => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

#[async_trait]
impl ProfileRepository for FakeProfileRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        if self.fail_reads {
            return Err(AppError::Internal("profile backend unavailable".to_owned()));
        }
        Ok(self.profiles.lock().await.get(&user_id).cloned())
    }

    async fn list_profiles(&self, filter: UserListFilter) -> AppResult<Vec<Profile>> {
        if self.fail_reads {
            return Err(AppError::Internal("profile backend unavailable".to_owned()));
        }

        let candidates: Vec<Profile> = self.profiles.lock().await.values().cloned().collect();
        let mut listed = Vec::new();
        for profile in candidates {
            if let Some(owner) = filter.within_team_of {
                if !self.is_below(profile.user_id, owner).await {
                    continue;
                }
            }
            if filter
                .account_status
                .is_some_and(|status| status != profile.account_status)
            {
                continue;
            }
            listed.push(profile);
        }
        listed.sort_by_key(|profile| profile.created_at);

        Ok(listed)
    }

    async fn create_profile(&self, profile: Profile) -> AppResult<()> {
        let mut profiles = self.profiles.lock().await;
        if profiles.contains_key(&profile.user_id) {
            return Err(AppError::Conflict(format!(
                "profile '{}' already exists",
                profile.user_id
            )));
        }
        profiles.insert(profile.user_id, profile);
        Ok(())
    }

    async fn delete_profile(&self, user_id: UserId) -> AppResult<()> {
        self.profiles.lock().await.remove(&user_id);
        Ok(())
    }

    async fn update_account_status(
        &self,
        user_id: UserId,
        status: AccountStatus,
    ) -> AppResult<()> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("profile '{user_id}' does not exist")))?;
        profile.account_status = status;
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeActivityLogRepository {
    pub events: Mutex<Vec<ActivityEvent>>,
    pub raw_records: Vec<ActivityLogRecord>,
    pub fail_appends: bool,
    pub fail_queries: bool,
}

impl FakeActivityLogRepository {
    pub fn failing_appends() -> Self {
        Self {
            fail_appends: true,
            ..Self::default()
        }
    }

    pub async fn stored(&self) -> Vec<ActivityEvent> {
        self.events.lock().await.clone()
    }

    async fn matching(&self, query: &ActivityLogQuery) -> AppResult<Vec<ActivityLogRecord>> {
        if self.fail_queries {
            return Err(AppError::Internal("activity query failed".to_owned()));
        }

        let mut records = self
            .events
            .lock()
            .await
            .iter()
            .map(ActivityLogRecord::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        records.extend(self.raw_records.iter().cloned());
        records.retain(|record| {
            query
                .action
                .as_deref()
                .is_none_or(|action| record.action == action)
                && query
                    .entity_type
                    .as_deref()
                    .is_none_or(|entity_type| record.entity_type.as_deref() == Some(entity_type))
                && query.since.is_none_or(|since| record.created_at > since)
                && query
                    .visible_to
                    .is_none_or(|rule| rule.admits_record(record))
        });

        Ok(records)
    }
}

#[async_trait]
impl ActivityLogRepository for FakeActivityLogRepository {
    async fn append_event(&self, event: ActivityEvent) -> AppResult<()> {
        if self.fail_appends {
            return Err(AppError::Internal("activity insert rejected".to_owned()));
        }
        self.events.lock().await.push(event);
        Ok(())
    }

    async fn query_events(&self, query: ActivityLogQuery) -> AppResult<Vec<ActivityLogRecord>> {
        let mut records = self.matching(&query).await?;
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        Ok(records
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn count_events(&self, query: ActivityLogQuery) -> AppResult<usize> {
        Ok(self.matching(&query).await?.len())
    }
}

#[derive(Default)]
pub(crate) struct FakeLoginEventRepository {
    pub events: Vec<LoginEvent>,
    pub directory: Vec<Profile>,
    pub fail: bool,
}

#[async_trait]
impl LoginEventRepository for FakeLoginEventRepository {
    async fn list_login_events_since(
        &self,
        since: DateTime<Utc>,
        within_team_of: Option<UserId>,
    ) -> AppResult<Vec<LoginEvent>> {
        if self.fail {
            return Err(AppError::Internal("login history unavailable".to_owned()));
        }

        let tree = OwnershipTree::from_profiles(self.directory.iter());
        Ok(self
            .events
            .iter()
            .filter(|event| {
                event.occurred_at > since
                    && within_team_of.is_none_or(|owner| tree.is_in_team_of(event.user_id, owner))
            })
            .cloned()
            .collect())
    }
}
