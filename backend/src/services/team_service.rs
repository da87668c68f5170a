//! Team settings managed by team admins.

use crate::auth::models::Caller;
use crate::database::models::{Team, UpdateTeamRepositoryRequest};
use crate::errors::{MISSING_CREDENTIALS, ServiceError, ServiceResult};
use crate::services::authorization_service::AuthorizationService;
use crate::services::context::AppContext;
use crate::services::github_service::RepoRef;

const REPOSITORY_DENIED: &str = "You must be an admin to link a repository.";

pub struct TeamService<'a> {
    ctx: &'a AppContext,
}

impl<'a> TeamService<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Links the team to a GitHub repository, or clears the link when the
    /// value is null or blank.
    pub async fn update_repository(
        &self,
        team_id: &str,
        request: UpdateTeamRepositoryRequest,
        caller: Option<Caller>,
    ) -> ServiceResult<Team> {
        let repo = match request.github_repo.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(value.parse::<RepoRef>()?),
            _ => None,
        };

        let caller = caller.ok_or_else(|| ServiceError::authentication(MISSING_CREDENTIALS))?;

        AuthorizationService::new(self.ctx.members.as_ref())
            .require_team_admin(team_id, &caller.user_id, REPOSITORY_DENIED)
            .await?;

        let repo = repo.map(|r| r.to_string());
        let updated = self
            .ctx
            .teams
            .update_github_repo(team_id, repo.as_deref())
            .await?;
        if !updated {
            return Err(ServiceError::not_found("Team", team_id));
        }

        match &repo {
            Some(repo) => tracing::info!("Team {} linked to {}", team_id, repo),
            None => tracing::info!("Team {} repository link cleared", team_id),
        }

        self.ctx
            .teams
            .get_team_by_id(team_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team", team_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{MemberRole, MembershipStatus};
    use crate::testing::{TestApp, caller};

    fn link(repo: Option<&str>) -> UpdateTeamRepositoryRequest {
        UpdateTeamRepositoryRequest {
            github_repo: repo.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_admin_links_and_clears_repository() {
        let app = TestApp::new();
        let admin = app.store.seed_user("a@x.com").await;
        let team = app.store.seed_team("Core", None).await;
        app.store
            .seed_membership(&team.id, &admin.id, MemberRole::Admin, MembershipStatus::Accepted)
            .await;
        let service = TeamService::new(&app.ctx);

        let team = service
            .update_repository(&team.id, link(Some(" acme/widgets ")), Some(caller(&admin.id, None)))
            .await
            .unwrap();
        assert_eq!(team.github_repo.as_deref(), Some("acme/widgets"));

        let team = service
            .update_repository(&team.id, link(Some("")), Some(caller(&admin.id, None)))
            .await
            .unwrap();
        assert_eq!(team.github_repo, None);
    }

    #[tokio::test]
    async fn test_invalid_repository_rejected_first() {
        let app = TestApp::new();
        let err = TeamService::new(&app.ctx)
            .update_repository("t1", link(Some("not a repo")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_member_cannot_link_repository() {
        let app = TestApp::new();
        let user = app.store.seed_user("b@x.com").await;
        let team = app.store.seed_team("Core", None).await;
        app.store
            .seed_membership(&team.id, &user.id, MemberRole::Member, MembershipStatus::Accepted)
            .await;

        let err = TeamService::new(&app.ctx)
            .update_repository(&team.id, link(Some("acme/widgets")), Some(caller(&user.id, None)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied { .. }));
        assert_eq!(
            app.ctx
                .teams
                .get_team_by_id(&team.id)
                .await
                .unwrap()
                .unwrap()
                .github_repo,
            None
        );
    }
}
