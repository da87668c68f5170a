//! GitHub contribution sync.
//!
//! A sync replaces the team's contribution snapshot: every accepted member
//! gets a row, with zero for members who authored none of the fetched
//! commits. Rows are written in a single batch after all reads succeed.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::auth::models::Caller;
use crate::database::models::{ContributionSummary, ContributionUpsert, SyncContributionsRequest};
use crate::errors::{GITHUB_NOT_LINKED, MISSING_CREDENTIALS, ServiceError, ServiceResult};
use crate::services::authorization_service::AuthorizationService;
use crate::services::context::AppContext;
use crate::services::github_service::{GitHubCommit, RepoRef};
use crate::utils::normalize_email;

const SYNC_DENIED: &str = "Permission denied. You must be an admin to sync contributions.";

/// Result of a completed sync.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Number of commits returned by GitHub, matched or not.
    pub commits_processed: usize,
    pub members_updated: u64,
    pub synced_at: DateTime<Utc>,
}

/// Counts commits per lowercased author email. Commits without an author
/// email are skipped.
pub fn aggregate_commit_counts(commits: &[GitHubCommit]) -> HashMap<String, i64> {
    let mut counts = HashMap::new();
    for email in commits.iter().filter_map(GitHubCommit::author_email) {
        *counts.entry(normalize_email(email)).or_insert(0) += 1;
    }
    counts
}

/// Builds one row per member from `(user_id, email)` pairs.
pub fn build_snapshot(
    team_id: &str,
    members: &[(String, String)],
    counts: &HashMap<String, i64>,
) -> Vec<ContributionUpsert> {
    members
        .iter()
        .map(|(user_id, email)| ContributionUpsert {
            team_id: team_id.to_string(),
            user_id: user_id.clone(),
            commit_count: counts.get(&normalize_email(email)).copied().unwrap_or(0),
        })
        .collect()
}

pub struct ContributionSyncService<'a> {
    ctx: &'a AppContext,
}

impl<'a> ContributionSyncService<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Fetches the team's commit history and stores a fresh snapshot.
    pub async fn sync(
        &self,
        request: SyncContributionsRequest,
        caller: Option<Caller>,
    ) -> ServiceResult<SyncOutcome> {
        let team_id = request
            .team_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::validation("Team ID is required."))?;

        let caller = caller.ok_or_else(|| ServiceError::authentication(MISSING_CREDENTIALS))?;

        AuthorizationService::new(self.ctx.members.as_ref())
            .require_team_admin(&team_id, &caller.user_id, SYNC_DENIED)
            .await?;

        let team = self
            .ctx
            .teams
            .get_team_by_id(&team_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team", &team_id))?;

        let repo: RepoRef = team
            .github_repo
            .as_deref()
            .filter(|repo| !repo.trim().is_empty())
            .ok_or_else(|| ServiceError::not_found("Linked GitHub repository for team", &team_id))?
            .parse()?;

        let token = caller
            .provider_token
            .as_deref()
            .ok_or_else(|| ServiceError::account_not_linked(GITHUB_NOT_LINKED))?;

        let commits = self.ctx.commits.list_commits(&repo, token).await?;
        let counts = aggregate_commit_counts(&commits);

        let member_ids = self.ctx.members.get_accepted_member_ids(&team_id).await?;
        let users = self.ctx.users.get_users_by_ids(&member_ids).await?;
        let members: Vec<(String, String)> = users.into_iter().map(|u| (u.id, u.email)).collect();

        let rows = build_snapshot(&team_id, &members, &counts);
        let synced_at = Utc::now();
        let members_updated = self
            .ctx
            .contributions
            .upsert_contributions(&rows, synced_at)
            .await?;

        tracing::info!(
            "Synced {} commits from {} into {} contribution rows for team {}",
            commits.len(),
            repo,
            members_updated,
            team_id
        );

        Ok(SyncOutcome {
            commits_processed: commits.len(),
            members_updated,
            synced_at,
        })
    }

    /// Current snapshot for a team, visible to its accepted members.
    pub async fn list_contributions(
        &self,
        team_id: &str,
        caller: Option<Caller>,
    ) -> ServiceResult<Vec<ContributionSummary>> {
        let caller = caller.ok_or_else(|| ServiceError::authentication(MISSING_CREDENTIALS))?;

        AuthorizationService::new(self.ctx.members.as_ref())
            .require_team_member(team_id, &caller.user_id)
            .await?;

        Ok(self.ctx.contributions.get_contribution_summaries(team_id).await?)
    }
}
