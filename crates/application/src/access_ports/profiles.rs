use std::collections::HashSet;

use async_trait::async_trait;

use staffline_core::{AppResult, UserId};
use staffline_domain::{AccountStatus, AncestryDepth, Profile};

/// Filter for profile listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserListFilter {
    /// Restricts the listing to accounts strictly below this account in the created-by tree.
    pub within_team_of: Option<UserId>,
    /// Restricts the listing to one status.
    pub account_status: Option<AccountStatus>,
}

/// Repository port for account profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds one profile.
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<Profile>>;

    /// Lists profiles matching the filter, oldest first.
    async fn list_profiles(&self, filter: UserListFilter) -> AppResult<Vec<Profile>>;

    /// Inserts a new profile.
    async fn create_profile(&self, profile: Profile) -> AppResult<()>;

    /// Removes a profile. Deleting an absent profile is not an error.
    async fn delete_profile(&self, user_id: UserId) -> AppResult<()>;

    /// Transitions the status of an existing profile.
    async fn update_account_status(&self, user_id: UserId, status: AccountStatus)
    -> AppResult<()>;
}

/// Walks the created-by chain of `user_id` through single-row profile lookups.
///
/// Returns creators nearest first and stops at the root, on a repeated account, or at the
/// depth limit.
pub async fn load_ancestry(
    repository: &dyn ProfileRepository,
    user_id: UserId,
    depth: AncestryDepth,
) -> AppResult<Vec<UserId>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([user_id]);
    let mut current = user_id;

    while chain.len() < depth.limit() {
        let Some(parent) = repository
            .find_profile(current)
            .await?
            .and_then(|profile| profile.created_by)
        else {
            break;
        };

        if !seen.insert(parent) {
            break;
        }

        chain.push(parent);
        current = parent;
    }

    Ok(chain)
}
