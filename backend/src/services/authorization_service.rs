//! Team-level authorization checks.
//!
//! Admin rights are read from the membership table on every request and are
//! never taken from the request body.

use crate::database::models::MembershipStatus;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::member_repository::TeamMemberRepository;

pub struct AuthorizationService<'a> {
    members: &'a dyn TeamMemberRepository,
}

impl<'a> AuthorizationService<'a> {
    pub fn new(members: &'a dyn TeamMemberRepository) -> Self {
        Self { members }
    }

    /// Whether `user_id` is an accepted admin of `team_id`.
    pub async fn is_admin_of(&self, team_id: &str, user_id: &str) -> ServiceResult<bool> {
        Ok(self.members.is_admin_of(team_id, user_id).await?)
    }

    /// Fails with `denial` unless the user is an admin of the team.
    ///
    /// A failed lookup is treated the same as a negative answer.
    pub async fn require_team_admin(
        &self,
        team_id: &str,
        user_id: &str,
        denial: &str,
    ) -> ServiceResult<()> {
        match self.is_admin_of(team_id, user_id).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!("User {} is not an admin of team {}", user_id, team_id);
                Err(ServiceError::permission_denied(denial))
            }
            Err(e) => {
                tracing::error!(
                    "Admin check failed for user {} on team {}: {}",
                    user_id,
                    team_id,
                    e
                );
                Err(ServiceError::permission_denied(denial))
            }
        }
    }

    /// Fails unless the user has accepted membership of the team.
    pub async fn require_team_member(&self, team_id: &str, user_id: &str) -> ServiceResult<()> {
        let membership = self.members.get_membership(team_id, user_id).await?;
        match membership {
            Some(member) if member.status == MembershipStatus::Accepted => Ok(()),
            _ => Err(ServiceError::permission_denied(
                "You must be a member of this team.",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::MemberRole;
    use crate::repositories::in_memory::InMemoryStore;

    #[tokio::test]
    async fn test_require_team_admin() {
        let store = InMemoryStore::new();
        let admin = store.seed_user("admin@x.com").await;
        let member = store.seed_user("member@x.com").await;
        let team = store.seed_team("Core", None).await;
        store
            .seed_membership(&team.id, &admin.id, MemberRole::Admin, MembershipStatus::Accepted)
            .await;
        store
            .seed_membership(&team.id, &member.id, MemberRole::Member, MembershipStatus::Accepted)
            .await;

        let auth = AuthorizationService::new(&store);
        assert!(auth.require_team_admin(&team.id, &admin.id, "no").await.is_ok());

        let err = auth
            .require_team_admin(&team.id, &member.id, "no")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied { ref message } if message == "no"));

        assert!(auth.require_team_member(&team.id, &member.id).await.is_ok());
        assert!(auth.require_team_member(&team.id, "stranger").await.is_err());
    }

    #[tokio::test]
    async fn test_pending_member_is_not_a_member() {
        let store = InMemoryStore::new();
        let user = store.seed_user("new@x.com").await;
        let team = store.seed_team("Core", None).await;
        store
            .seed_membership(&team.id, &user.id, MemberRole::Member, MembershipStatus::Pending)
            .await;

        let auth = AuthorizationService::new(&store);
        assert!(auth.require_team_member(&team.id, &user.id).await.is_err());
    }
}
