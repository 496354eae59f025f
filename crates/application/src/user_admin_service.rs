//! Privileged account mutations.
//!
//! Every mutation is checked against the permission matrix before it touches storage and is
//! followed by a best-effort audit event. A failed audit write never fails the mutation.

use std::sync::Arc;

use staffline_core::{AppError, AppResult, UserId, UserIdentity};
use staffline_domain::{
    ActivityAction, ActivityDetails, Capability, PermissionMatrix, Profile, Role,
};

use crate::{
    ActivityRecorder, ProfileRepository, RecordActivityInput, RoleRepository, RoleResolver,
    UserListFilter,
};

mod listing;
mod provisioning;
mod roles;
mod status;

pub use provisioning::ProvisionUserInput;

/// Application service for account administration.
#[derive(Clone)]
pub struct UserAdminService {
    role_resolver: RoleResolver,
    role_repository: Arc<dyn RoleRepository>,
    profile_repository: Arc<dyn ProfileRepository>,
    recorder: ActivityRecorder,
}

impl UserAdminService {
    /// Creates a user admin service from required dependencies.
    #[must_use]
    pub fn new(
        role_resolver: RoleResolver,
        role_repository: Arc<dyn RoleRepository>,
        profile_repository: Arc<dyn ProfileRepository>,
        recorder: ActivityRecorder,
    ) -> Self {
        Self {
            role_resolver,
            role_repository,
            profile_repository,
            recorder,
        }
    }

    async fn require(&self, actor: &UserIdentity, capability: Capability) -> AppResult<Role> {
        let role = self.role_resolver.resolve(actor.user_id()).await;
        PermissionMatrix::require(role, capability)?;
        Ok(role)
    }

    async fn find_target(&self, user_id: UserId) -> AppResult<Profile> {
        self.profile_repository
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
    }

    fn team_filter(role: Role, actor: UserId) -> UserListFilter {
        if PermissionMatrix::has(role, Capability::ViewAllUsers) {
            UserListFilter::default()
        } else {
            UserListFilter {
                within_team_of: Some(actor),
                ..UserListFilter::default()
            }
        }
    }

    async fn audit(
        &self,
        actor: &UserIdentity,
        action: ActivityAction,
        target: UserId,
        details: ActivityDetails,
    ) {
        self.recorder
            .record(
                actor.user_id(),
                RecordActivityInput {
                    action: action.as_str().to_owned(),
                    entity_type: Some("user".to_owned()),
                    entity_id: Some(target.to_string()),
                    details: Some(details),
                    target_user: Some(target),
                },
            )
            .await;
    }
}
