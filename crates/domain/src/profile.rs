//! Account profile types and the created-by ownership tree.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staffline_core::{AppError, AppResult, UserId};

/// Lifecycle status of an account. Profiles are never deleted, only transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account may sign in and act.
    Active,
    /// Account was blocked by an administrator.
    Suspended,
    /// Account was provisioned but not activated yet.
    Pending,
}

impl AccountStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Pending => "pending",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "pending" => Ok(Self::Pending),
            _ => Err(AppError::Validation(format!(
                "unknown account status value '{value}'"
            ))),
        }
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, lower-cased email address.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@' and a local part".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Account profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Account identifier.
    pub user_id: UserId,
    /// Login email.
    pub email: EmailAddress,
    /// Display name.
    pub full_name: String,
    /// Lifecycle status.
    pub account_status: AccountStatus,
    /// Account that provisioned this one; `None` for root accounts.
    pub created_by: Option<UserId>,
    /// Provisioning timestamp.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Returns a copy with a new status, rejecting no-op transitions.
    pub fn transition_to(&self, status: AccountStatus) -> AppResult<Self> {
        if self.account_status == status {
            return Err(AppError::Validation(format!(
                "account '{}' is already {}",
                self.user_id,
                status.as_str()
            )));
        }

        Ok(Self {
            account_status: status,
            ..self.clone()
        })
    }
}

/// How far up the created-by tree an ancestry capture walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AncestryDepth {
    /// Only the immediate creator.
    SingleHop,
    /// Every creator up to the root, bounded by `max_depth` links.
    Full {
        /// Maximum number of ancestors captured.
        max_depth: usize,
    },
}

impl AncestryDepth {
    /// Maximum number of ancestors this policy captures.
    #[must_use]
    pub fn limit(&self) -> usize {
        match self {
            Self::SingleHop => 1,
            Self::Full { max_depth } => *max_depth,
        }
    }
}

impl Default for AncestryDepth {
    fn default() -> Self {
        Self::Full { max_depth: 16 }
    }
}

/// In-memory view of the created-by tree built from a profile listing.
#[derive(Debug, Clone, Default)]
pub struct OwnershipTree {
    parents: HashMap<UserId, UserId>,
}

impl OwnershipTree {
    /// Builds the tree from profile rows.
    #[must_use]
    pub fn from_profiles<'a, I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = &'a Profile>,
    {
        let parents = profiles
            .into_iter()
            .filter_map(|profile| profile.created_by.map(|parent| (profile.user_id, parent)))
            .collect();

        Self { parents }
    }

    /// Returns the creators of `user_id`, nearest first. Stops at the root, on a cycle, or at
    /// the depth limit.
    #[must_use]
    pub fn ancestry(&self, user_id: UserId, depth: AncestryDepth) -> Vec<UserId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([user_id]);
        let mut current = user_id;

        while chain.len() < depth.limit() {
            let Some(parent) = self.parents.get(&current).copied() else {
                break;
            };
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        chain
    }

    /// Returns whether `member` sits strictly below `owner` in the tree.
    #[must_use]
    pub fn is_in_team_of(&self, member: UserId, owner: UserId) -> bool {
        self.ancestry(member, AncestryDepth::Full { max_depth: usize::MAX })
            .contains(&owner)
    }
}

/// Sign-in attempt row consumed by the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    /// Account that attempted to sign in.
    pub user_id: UserId,
    /// Attempt timestamp.
    pub occurred_at: DateTime<Utc>,
    /// Whether the attempt succeeded.
    pub succeeded: bool,
}
