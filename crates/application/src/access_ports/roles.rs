use async_trait::async_trait;

use staffline_core::{AppResult, UserId};
use staffline_domain::RoleAssignment;

/// Repository port for role rows.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists every role row stored for one account.
    ///
    /// More than one row is a data anomaly the caller resolves by priority.
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// Lists all role rows.
    async fn list_role_assignments(&self) -> AppResult<Vec<RoleAssignment>>;

    /// Deletes every role row of the account, then inserts `assignment`, atomically.
    async fn replace_role(&self, assignment: RoleAssignment) -> AppResult<()>;
}
