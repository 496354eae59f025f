use chrono::Utc;
use serde_json::Map;

use staffline_domain::{RoleAssignment, RoleChangedDetails};
use tracing::info;

use super::*;

impl UserAdminService {
    /// Replaces the role of `target` and returns its refreshed effective role.
    ///
    /// Existing rows are deleted and the new row inserted in one unit of work.
    pub async fn change_role(
        &self,
        actor: &UserIdentity,
        target: UserId,
        role: Role,
    ) -> AppResult<Role> {
        self.require(actor, Capability::ManageRoles).await?;
        self.find_target(target).await?;

        let previous_role = Role::highest_privilege(
            self.role_repository
                .list_roles_for_user(target)
                .await?
                .into_iter()
                .map(|row| row.role),
        );

        let assignment = RoleAssignment::new(target, role, Some(actor.user_id()), Utc::now())?;
        self.role_repository.replace_role(assignment).await?;

        let effective = self.role_resolver.refetch(target).await;
        info!(
            actor = %actor.user_id(),
            target = %target,
            previous = previous_role.map(|role| role.as_str()).unwrap_or("none"),
            role = effective.as_str(),
            "changed account role"
        );

        self.audit(
            actor,
            ActivityAction::RoleChanged,
            target,
            ActivityDetails::RoleChanged(RoleChangedDetails {
                previous_role,
                new_role: role,
                extra: Map::new(),
            }),
        )
        .await;

        Ok(effective)
    }
}
