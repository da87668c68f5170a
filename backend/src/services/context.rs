//! Shared dependencies handed to every request.
//!
//! The context only holds connection pools, HTTP clients and the JWT keys;
//! services are built from it per request and keep no state of their own.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::repositories::contribution_repository::{
    ContributionRepository, SqliteContributionRepository,
};
use crate::repositories::in_memory::InMemoryStore;
use crate::repositories::member_repository::{SqliteTeamMemberRepository, TeamMemberRepository};
use crate::repositories::team_repository::{SqliteTeamRepository, TeamRepository};
use crate::repositories::user_repository::{SqliteUserRepository, UserDirectory};
use crate::services::email_service::{EmailService, Mailer};
use crate::services::github_service::{CommitSource, GitHubClient};
use crate::utils::jwt::JwtUtils;

#[derive(Clone)]
pub struct AppContext {
    pub teams: Arc<dyn TeamRepository>,
    pub members: Arc<dyn TeamMemberRepository>,
    pub contributions: Arc<dyn ContributionRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub commits: Arc<dyn CommitSource>,
    /// `None` when SMTP is not configured; invitation emails are then skipped.
    pub mailer: Option<Arc<dyn Mailer>>,
    pub jwt: Arc<JwtUtils>,
}

impl AppContext {
    /// Builds a context whose repositories share one SQLite pool.
    pub fn with_sqlite(pool: SqlitePool, config: &Config) -> Result<Self> {
        Ok(Self {
            teams: Arc::new(SqliteTeamRepository::new(pool.clone())),
            members: Arc::new(SqliteTeamMemberRepository::new(pool.clone())),
            contributions: Arc::new(SqliteContributionRepository::new(pool.clone())),
            users: Arc::new(SqliteUserRepository::new(pool)),
            commits: Arc::new(github_client(config)?),
            mailer: mailer(config),
            jwt: Arc::new(JwtUtils::new(&config.jwt_secret)),
        })
    }

    /// Builds a context whose repositories all point at one in-memory store.
    pub fn with_memory(store: Arc<InMemoryStore>, config: &Config) -> Result<Self> {
        Ok(Self {
            teams: store.clone(),
            members: store.clone(),
            contributions: store.clone(),
            users: store,
            commits: Arc::new(github_client(config)?),
            mailer: mailer(config),
            jwt: Arc::new(JwtUtils::new(&config.jwt_secret)),
        })
    }
}

fn github_client(config: &Config) -> Result<GitHubClient> {
    GitHubClient::new(
        &config.github_api_url,
        Duration::from_secs(config.github_timeout_seconds),
    )
}

fn mailer(config: &Config) -> Option<Arc<dyn Mailer>> {
    match config.email_config() {
        Some(email_config) => match EmailService::new(email_config) {
            Ok(service) => {
                tracing::info!("Email service initialized successfully");
                Some(Arc::new(service))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize email service: {}. Email notifications will be disabled.",
                    e
                );
                None
            }
        },
        None => {
            tracing::warn!("Email configuration not found. Email notifications will be disabled.");
            None
        }
    }
}
