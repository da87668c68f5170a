//! GitHub REST client for commit history.
//!
//! Calls are made with the caller's delegated OAuth token. Only the default
//! first page of commits is requested; GitHub's own limits apply.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::models::Caller;
use crate::database::models::GitHubProxyRequest;
use crate::errors::{GITHUB_NOT_LINKED, MISSING_CREDENTIALS, ServiceError, ServiceResult};
use crate::services::context::AppContext;

/// A repository reference in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoRef {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ServiceError::validation(format!(
                "Invalid repository '{}'. Use the format owner/repository.",
                s.trim()
            ))
        };

        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        let name = name.strip_suffix(".git").unwrap_or(name);

        let owner_ok = !owner.is_empty()
            && owner.len() <= 39
            && owner.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        let name_ok = !name.is_empty()
            && name.len() <= 100
            && name != "."
            && name != ".."
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if !owner_ok || !name_ok {
            return Err(invalid());
        }

        Ok(RepoRef {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub commit: CommitDetails,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetails {
    pub author: Option<CommitAuthor>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl GitHubCommit {
    /// Email recorded as the git author, if any.
    pub fn author_email(&self) -> Option<&str> {
        self.commit
            .author
            .as_ref()
            .and_then(|author| author.email.as_deref())
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

/// Source of commit history for a repository.
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn list_commits(&self, repo: &RepoRef, token: &str) -> ServiceResult<Vec<GitHubCommit>>;
}

/// GitHub REST API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: Client,
    api_url: String,
}

impl GitHubClient {
    /// Creates a new GitHubClient against `api_url` (e.g. `https://api.github.com`).
    pub fn new(api_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("CollabMate/1.0")
            .build()?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CommitSource for GitHubClient {
    async fn list_commits(&self, repo: &RepoRef, token: &str) -> ServiceResult<Vec<GitHubCommit>> {
        let url = format!("{}/repos/{}/{}/commits", self.api_url, repo.owner, repo.name);
        tracing::debug!("Fetching commits from {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| ServiceError::external_service(format!("GitHub API error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<GitHubErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string(),
            };
            tracing::warn!("GitHub returned {} for {}: {}", status, repo, message);
            return Err(ServiceError::external_service(format!(
                "GitHub API error: {message}"
            )));
        }

        response.json::<Vec<GitHubCommit>>().await.map_err(|e| {
            ServiceError::external_service(format!("GitHub API error: invalid commit list: {e}"))
        })
    }
}

/// Relays a repository's commit list to the signed-in user.
pub struct GitHubProxyService<'a> {
    ctx: &'a AppContext,
}

impl<'a> GitHubProxyService<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    pub async fn list_commits(
        &self,
        request: GitHubProxyRequest,
        caller: Option<Caller>,
    ) -> ServiceResult<Vec<GitHubCommit>> {
        let repo = request
            .repo
            .filter(|repo| !repo.trim().is_empty())
            .ok_or_else(|| ServiceError::validation("Repository is required."))?
            .parse::<RepoRef>()?;

        let caller = caller.ok_or_else(|| ServiceError::authentication(MISSING_CREDENTIALS))?;
        let token = caller
            .provider_token
            .ok_or_else(|| ServiceError::account_not_linked(GITHUB_NOT_LINKED))?;

        self.ctx.commits.list_commits(&repo, &token).await
    }
}
