use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use staffline_core::AppError;

use crate::Role;

/// Capabilities enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Allows opening the admin console.
    ViewAdminPanel,
    /// Allows reading one's own activity trail.
    ViewOwnActivity,
    /// Allows listing accounts and activity in one's created-by subtree.
    ViewTeamUsers,
    /// Allows listing every account and every activity event.
    ViewAllUsers,
    /// Allows provisioning administrator accounts.
    CreateAdmin,
    /// Allows provisioning regular accounts.
    CreateUser,
    /// Allows editing accounts inside one's team.
    EditOwnUsers,
    /// Allows editing any account.
    EditAnyUser,
    /// Allows deleting accounts inside one's team.
    DeleteOwnUsers,
    /// Allows deleting any account.
    DeleteAnyUser,
    /// Allows changing account status inside one's team.
    SuspendOwnUsers,
    /// Allows changing the status of any account.
    SuspendAnyUser,
    /// Allows replacing role assignments.
    ManageRoles,
    /// Allows exporting the full activity log.
    ExportAllData,
}

impl Capability {
    /// Returns a stable storage value for this capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewAdminPanel => "view-admin-panel",
            Self::ViewOwnActivity => "view-own-activity",
            Self::ViewTeamUsers => "view-team-users",
            Self::ViewAllUsers => "view-all-users",
            Self::CreateAdmin => "create-admin",
            Self::CreateUser => "create-user",
            Self::EditOwnUsers => "edit-own-users",
            Self::EditAnyUser => "edit-any-user",
            Self::DeleteOwnUsers => "delete-own-users",
            Self::DeleteAnyUser => "delete-any-user",
            Self::SuspendOwnUsers => "suspend-own-users",
            Self::SuspendAnyUser => "suspend-any-user",
            Self::ManageRoles => "manage-roles",
            Self::ExportAllData => "export-all-data",
        }
    }

    /// Returns all known capabilities.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Capability] = &[
            Capability::ViewAdminPanel,
            Capability::ViewOwnActivity,
            Capability::ViewTeamUsers,
            Capability::ViewAllUsers,
            Capability::CreateAdmin,
            Capability::CreateUser,
            Capability::EditOwnUsers,
            Capability::EditAnyUser,
            Capability::DeleteOwnUsers,
            Capability::DeleteAnyUser,
            Capability::SuspendOwnUsers,
            Capability::SuspendAnyUser,
            Capability::ManageRoles,
            Capability::ExportAllData,
        ];

        ALL
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|capability| capability.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown capability value '{value}'")))
    }
}

/// Capabilities granted to one role. Derived on every check, never persisted.
pub type PermissionSet = BTreeSet<Capability>;

const SUPER_ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::ViewAdminPanel,
    Capability::ViewOwnActivity,
    Capability::ViewTeamUsers,
    Capability::ViewAllUsers,
    Capability::CreateAdmin,
    Capability::CreateUser,
    Capability::EditOwnUsers,
    Capability::EditAnyUser,
    Capability::DeleteOwnUsers,
    Capability::DeleteAnyUser,
    Capability::SuspendOwnUsers,
    Capability::SuspendAnyUser,
    Capability::ManageRoles,
    Capability::ExportAllData,
];

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::ViewAdminPanel,
    Capability::ViewOwnActivity,
    Capability::ViewTeamUsers,
    Capability::CreateUser,
    Capability::EditOwnUsers,
    Capability::DeleteOwnUsers,
    Capability::SuspendOwnUsers,
];

const USER_CAPABILITIES: &[Capability] = &[Capability::ViewOwnActivity];

const NO_CAPABILITIES: &[Capability] = &[];

/// Static role to capability table.
///
/// Each row is written out by hand so it can be audited on its own; the containment between
/// rows is checked by tests rather than derived.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Returns the raw table row for a role.
    #[must_use]
    pub fn capabilities(role: Role) -> &'static [Capability] {
        match role {
            Role::SuperAdmin => SUPER_ADMIN_CAPABILITIES,
            Role::Admin => ADMIN_CAPABILITIES,
            Role::User => USER_CAPABILITIES,
            Role::None => NO_CAPABILITIES,
        }
    }

    /// Returns the permission set for a role.
    #[must_use]
    pub fn permissions_for(role: Role) -> PermissionSet {
        Self::capabilities(role).iter().copied().collect()
    }

    /// Returns whether the role holds the capability.
    #[must_use]
    pub fn has(role: Role, capability: Capability) -> bool {
        Self::capabilities(role).contains(&capability)
    }

    /// Fails with [`AppError::Forbidden`] when the role lacks the capability.
    pub fn require(role: Role, capability: Capability) -> Result<(), AppError> {
        if Self::has(role, capability) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "role '{}' is missing capability '{}'",
            role.as_str(),
            capability.as_str()
        )))
    }
}
