use async_trait::async_trait;
use chrono::{DateTime, Utc};

use staffline_core::{AppResult, UserId};
use staffline_domain::LoginEvent;

/// Repository port for sign-in history.
#[async_trait]
pub trait LoginEventRepository: Send + Sync {
    /// Lists sign-in attempts that happened after `since`.
    ///
    /// With `within_team_of`, only attempts by accounts strictly below that account in the
    /// created-by tree are listed.
    async fn list_login_events_since(
        &self,
        since: DateTime<Utc>,
        within_team_of: Option<UserId>,
    ) -> AppResult<Vec<LoginEvent>>;
}
