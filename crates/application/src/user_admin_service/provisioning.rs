use chrono::Utc;
use serde_json::Map;

use staffline_core::NonEmptyString;
use staffline_domain::{AccountStatus, EmailAddress, RoleAssignment, UserProvisionedDetails};
use tracing::{error, info};

use super::*;

/// Input payload for provisioning an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionUserInput {
    /// Sign-in email of the new account.
    pub email: String,
    /// Display name of the new account.
    pub full_name: String,
    /// Initial role.
    pub role: Role,
}

impl UserAdminService {
    /// Creates a pending account owned by `actor` with its initial role.
    ///
    /// Admin accounts need `create-admin`, user accounts `create-user` and super admin
    /// accounts `manage-roles`. When the role row cannot be written the profile is removed
    /// again and the error returned.
    pub async fn provision_user(
        &self,
        actor: &UserIdentity,
        input: ProvisionUserInput,
    ) -> AppResult<Profile> {
        let required = match input.role {
            Role::SuperAdmin => Capability::ManageRoles,
            Role::Admin => Capability::CreateAdmin,
            Role::User => Capability::CreateUser,
            Role::None => {
                return Err(AppError::Validation(
                    "new accounts must be given an assignable role".to_owned(),
                ));
            }
        };
        self.require(actor, required).await?;

        let email = EmailAddress::new(input.email)?;
        let full_name = NonEmptyString::new(input.full_name)?;
        let now = Utc::now();
        let user_id = UserId::new();

        let profile = Profile {
            user_id,
            email,
            full_name: full_name.into(),
            account_status: AccountStatus::Pending,
            created_by: Some(actor.user_id()),
            created_at: now,
        };
        let assignment = RoleAssignment::new(user_id, input.role, Some(actor.user_id()), now)?;

        self.profile_repository
            .create_profile(profile.clone())
            .await?;
        if let Err(insert_error) = self.role_repository.replace_role(assignment).await {
            // No account may exist without its initial role row.
            if let Err(rollback) = self.profile_repository.delete_profile(user_id).await {
                error!(
                    user_id = %user_id,
                    error = %rollback,
                    "failed to roll back profile after role insert failure"
                );
            }
            return Err(insert_error);
        }

        info!(
            actor = %actor.user_id(),
            user_id = %user_id,
            role = input.role.as_str(),
            "provisioned account"
        );

        self.audit(
            actor,
            ActivityAction::UserProvisioned,
            user_id,
            ActivityDetails::UserProvisioned(UserProvisionedDetails {
                email: profile.email.as_str().to_owned(),
                role: input.role,
                extra: Map::new(),
            }),
        )
        .await;

        Ok(profile)
    }
}
