//! Effective role resolution with a session-scoped cache.
//!
//! The role of an account is only ever sourced from [`RoleRepository`]. Lookup failures fail
//! closed to [`Role::User`] and are not cached, so the next call retries. Concurrent resolves
//! for the same account share one in-flight lookup.

use std::collections::HashMap;
use std::sync::Arc;

use staffline_core::{AppResult, UserId};
use staffline_domain::Role;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::RoleRepository;

/// Session-scoped role cache owned by one [`RoleResolver`].
///
/// Create one per viewer session; it is never shared through globals.
#[derive(Debug, Default)]
pub struct RoleCache {
    entries: Mutex<HashMap<UserId, Arc<OnceCell<Role>>>>,
}

impl RoleCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached role, if one was resolved.
    pub async fn cached(&self, user_id: UserId) -> Option<Role> {
        self.entries
            .lock()
            .await
            .get(&user_id)
            .and_then(|cell| cell.get().copied())
    }

    async fn slot(&self, user_id: UserId) -> Arc<OnceCell<Role>> {
        self.entries
            .lock()
            .await
            .entry(user_id)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    async fn fresh_slot(&self, user_id: UserId) -> Arc<OnceCell<Role>> {
        let slot = Arc::new(OnceCell::new());
        self.entries.lock().await.insert(user_id, slot.clone());
        slot
    }
}

/// Resolves the single effective role of an account.
#[derive(Clone)]
pub struct RoleResolver {
    repository: Arc<dyn RoleRepository>,
    cache: Arc<RoleCache>,
}

impl RoleResolver {
    /// Creates a resolver over an injected session cache.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>, cache: Arc<RoleCache>) -> Self {
        Self { repository, cache }
    }

    /// Returns the effective role, from cache when available.
    pub async fn resolve(&self, user_id: UserId) -> Role {
        let slot = self.cache.slot(user_id).await;
        self.resolve_into(slot, user_id).await
    }

    /// Forces a fresh lookup and overwrites the cached role.
    pub async fn refetch(&self, user_id: UserId) -> Role {
        let slot = self.cache.fresh_slot(user_id).await;
        self.resolve_into(slot, user_id).await
    }

    /// Returns [`Role::None`] for anonymous viewers, otherwise resolves.
    pub async fn resolve_viewer(&self, viewer: Option<UserId>) -> Role {
        match viewer {
            Some(user_id) => self.resolve(user_id).await,
            None => Role::None,
        }
    }

    async fn resolve_into(&self, slot: Arc<OnceCell<Role>>, user_id: UserId) -> Role {
        match slot.get_or_try_init(|| self.lookup(user_id)).await {
            Ok(role) => *role,
            Err(error) => {
                warn!(
                    user_id = %user_id,
                    error = %error,
                    "role lookup failed, falling back to least privilege"
                );
                Role::User
            }
        }
    }

    async fn lookup(&self, user_id: UserId) -> AppResult<Role> {
        let rows = self.repository.list_roles_for_user(user_id).await?;

        if rows.len() > 1 {
            warn!(
                user_id = %user_id,
                row_count = rows.len(),
                "multiple role rows found, using the most privileged one"
            );
        }

        let role = Role::highest_privilege(rows.iter().map(|row| row.role)).unwrap_or_else(|| {
            debug!(user_id = %user_id, "no role rows found, defaulting to user");
            Role::User
        });

        Ok(role)
    }
}

#[cfg(test)]
mod tests;
