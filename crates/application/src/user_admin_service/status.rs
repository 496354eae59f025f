use serde_json::Map;

use staffline_domain::{AccountStatus, StatusChangedDetails};
use tracing::info;

use super::*;

impl UserAdminService {
    /// Transitions the account status of `target`.
    ///
    /// Needs `suspend-any-user`, or `suspend-own-users` when `target` sits below the actor in
    /// the created-by tree. Actors cannot change their own status or that of a more
    /// privileged account.
    pub async fn set_account_status(
        &self,
        actor: &UserIdentity,
        target: UserId,
        status: AccountStatus,
    ) -> AppResult<Profile> {
        if actor.user_id() == target {
            return Err(AppError::Forbidden(
                "accounts cannot change their own status".to_owned(),
            ));
        }

        let role = self.role_resolver.resolve(actor.user_id()).await;
        if !PermissionMatrix::has(role, Capability::SuspendAnyUser) {
            PermissionMatrix::require(role, Capability::SuspendOwnUsers)?;
            if !self.is_in_team(actor.user_id(), target).await? {
                return Err(AppError::Forbidden(format!(
                    "user '{target}' is outside the team of '{}'",
                    actor.user_id()
                )));
            }
        }

        let target_role = Role::highest_privilege(
            self.role_repository
                .list_roles_for_user(target)
                .await?
                .into_iter()
                .map(|row| row.role),
        )
        .unwrap_or(Role::None);
        if target_role.priority() < role.priority() {
            return Err(AppError::Forbidden(format!(
                "'{}' cannot change the status of higher role '{}'",
                role.as_str(),
                target_role.as_str()
            )));
        }

        let profile = self.find_target(target).await?;
        let updated = profile.transition_to(status)?;
        self.profile_repository
            .update_account_status(target, status)
            .await?;

        info!(
            actor = %actor.user_id(),
            target = %target,
            status = status.as_str(),
            "changed account status"
        );

        self.audit(
            actor,
            ActivityAction::StatusChanged,
            target,
            ActivityDetails::StatusChanged(StatusChangedDetails {
                previous_status: profile.account_status,
                new_status: status,
                extra: Map::new(),
            }),
        )
        .await;

        Ok(updated)
    }

    async fn is_in_team(&self, owner: UserId, member: UserId) -> AppResult<bool> {
        let team = self
            .profile_repository
            .list_profiles(UserListFilter {
                within_team_of: Some(owner),
                ..UserListFilter::default()
            })
            .await?;

        Ok(team.iter().any(|profile| profile.user_id == member))
    }
}
