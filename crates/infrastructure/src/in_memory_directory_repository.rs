use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use staffline_application::{
    LoginEventRepository, ProfileRepository, RoleRepository, UserListFilter,
};
use staffline_core::{AppError, AppResult, UserId};
use staffline_domain::{AccountStatus, LoginEvent, OwnershipTree, Profile, RoleAssignment};

/// In-memory directory of profiles, role rows and sign-in history.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryRepository {
    profiles: RwLock<HashMap<UserId, Profile>>,
    role_rows: RwLock<Vec<RoleAssignment>>,
    login_events: RwLock<Vec<LoginEvent>>,
}

impl InMemoryDirectoryRepository {
    /// Creates an empty in-memory directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one sign-in attempt.
    pub async fn record_login(&self, event: LoginEvent) {
        self.login_events.write().await.push(event);
    }
}

#[async_trait]
impl RoleRepository for InMemoryDirectoryRepository {
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .role_rows
            .read()
            .await
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_role_assignments(&self) -> AppResult<Vec<RoleAssignment>> {
        Ok(self.role_rows.read().await.clone())
    }

    async fn replace_role(&self, assignment: RoleAssignment) -> AppResult<()> {
        let mut role_rows = self.role_rows.write().await;
        role_rows.retain(|row| row.user_id != assignment.user_id);
        role_rows.push(assignment);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryDirectoryRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn list_profiles(&self, filter: UserListFilter) -> AppResult<Vec<Profile>> {
        let profiles = self.profiles.read().await;
        let tree = OwnershipTree::from_profiles(profiles.values());

        let mut listed: Vec<Profile> = profiles
            .values()
            .filter(|profile| {
                filter
                    .within_team_of
                    .is_none_or(|owner| tree.is_in_team_of(profile.user_id, owner))
                    && filter
                        .account_status
                        .is_none_or(|status| status == profile.account_status)
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.user_id.cmp(&right.user_id))
        });

        Ok(listed)
    }

    async fn create_profile(&self, profile: Profile) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;

        if profiles.contains_key(&profile.user_id) {
            return Err(AppError::Conflict(format!(
                "profile '{}' already exists",
                profile.user_id
            )));
        }
        if profiles
            .values()
            .any(|existing| existing.email == profile.email)
        {
            return Err(AppError::Conflict(format!(
                "an account with email '{}' already exists",
                profile.email.as_str()
            )));
        }

        profiles.insert(profile.user_id, profile);
        Ok(())
    }

    async fn delete_profile(&self, user_id: UserId) -> AppResult<()> {
        self.profiles.write().await.remove(&user_id);
        Ok(())
    }

    async fn update_account_status(
        &self,
        user_id: UserId,
        status: AccountStatus,
    ) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("profile '{user_id}' does not exist")))?;
        profile.account_status = status;
        Ok(())
    }
}

#[async_trait]
impl LoginEventRepository for InMemoryDirectoryRepository {
    async fn list_login_events_since(
        &self,
        since: DateTime<Utc>,
        within_team_of: Option<UserId>,
    ) -> AppResult<Vec<LoginEvent>> {
        let profiles = self.profiles.read().await;
        let tree = OwnershipTree::from_profiles(profiles.values());

        let mut events: Vec<LoginEvent> = self
            .login_events
            .read()
            .await
            .iter()
            .filter(|event| {
                event.occurred_at > since
                    && within_team_of.is_none_or(|owner| tree.is_in_team_of(event.user_id, owner))
            })
            .cloned()
            .collect();
        events.sort_by(|left, right| right.occurred_at.cmp(&left.occurred_at));

        Ok(events)
    }
}
