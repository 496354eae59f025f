use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staffline_core::{AppError, UserId};

/// Effective role of a viewer or actor.
///
/// `None` is only produced for anonymous viewers; role rows in storage always carry one of the
/// three assignable roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform owner with unrestricted access.
    SuperAdmin,
    /// Agency administrator managing the accounts they created.
    Admin,
    /// Regular recruiter or consultant account.
    User,
    /// No identity at all.
    None,
}

impl Role {
    /// Roles that may be persisted in a role assignment.
    pub const ASSIGNABLE: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::User];

    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::User => "user",
            Self::None => "none",
        }
    }

    /// Returns the privilege priority, lower is more privileged.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::SuperAdmin => 1,
            Self::Admin => 2,
            Self::User => 3,
            Self::None => u8::MAX,
        }
    }

    /// Returns whether the role may be stored in a role assignment.
    #[must_use]
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Picks the most privileged role out of possibly anomalous duplicate rows.
    #[must_use]
    pub fn highest_privilege<I>(roles: I) -> Option<Role>
    where
        I: IntoIterator<Item = Role>,
    {
        roles.into_iter().min_by_key(Role::priority)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    /// Parses an assignable role; `none` is never a storage value.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Role row linking one account to one assignable role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Account the role belongs to.
    pub user_id: UserId,
    /// Assigned role.
    pub role: Role,
    /// Account that performed the assignment, if known.
    pub assigned_by: Option<UserId>,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// Creates a validated role assignment.
    pub fn new(
        user_id: UserId,
        role: Role,
        assigned_by: Option<UserId>,
        assigned_at: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        if !role.is_assignable() {
            return Err(AppError::Validation(format!(
                "role '{}' cannot be assigned to user '{user_id}'",
                role.as_str()
            )));
        }

        Ok(Self {
            user_id,
            role,
            assigned_by,
            assigned_at,
        })
    }
}
