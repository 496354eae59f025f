use super::*;

impl UserAdminService {
    /// Lists the accounts `actor` may manage, oldest first.
    ///
    /// Super admins see every account; admins see their created-by subtree.
    pub async fn list_users(&self, actor: &UserIdentity) -> AppResult<Vec<Profile>> {
        let role = self.require(actor, Capability::ViewTeamUsers).await?;
        self.profile_repository
            .list_profiles(Self::team_filter(role, actor.user_id()))
            .await
    }
}
