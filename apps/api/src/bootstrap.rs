use chrono::Utc;
use staffline_core::{AppResult, UserId};
use staffline_domain::{AccountStatus, EmailAddress, Profile, Role, RoleAssignment};
use tracing::info;

use crate::state::Repositories;

/// Ensures `user_id` exists as an active account holding `super_admin`.
///
/// Existing profiles are left untouched; only a missing or lower role is replaced.
pub async fn ensure_super_admin(repositories: &Repositories, user_id: UserId) -> AppResult<()> {
    let now = Utc::now();

    if repositories.profiles.find_profile(user_id).await?.is_none() {
        repositories
            .profiles
            .create_profile(Profile {
                user_id,
                email: EmailAddress::new(format!("{user_id}@bootstrap.staffline.local"))?,
                full_name: "Bootstrap Super Admin".to_owned(),
                account_status: AccountStatus::Active,
                created_by: None,
                created_at: now,
            })
            .await?;
        info!(%user_id, "created bootstrap super admin profile");
    }

    let current_role = Role::highest_privilege(
        repositories
            .roles
            .list_roles_for_user(user_id)
            .await?
            .iter()
            .map(|assignment| assignment.role),
    );
    if current_role != Some(Role::SuperAdmin) {
        repositories
            .roles
            .replace_role(RoleAssignment::new(user_id, Role::SuperAdmin, None, now)?)
            .await?;
        info!(%user_id, "granted super_admin to bootstrap account");
    }

    Ok(())
}
