//! Fakes shared by the service and router tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::auth::models::Caller;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::in_memory::InMemoryStore;
use crate::services::context::AppContext;
use crate::services::email_service::Mailer;
use crate::services::github_service::{
    CommitAuthor, CommitDetails, CommitSource, GitHubCommit, RepoRef,
};
use crate::utils::jwt::JwtUtils;

pub const TEST_SECRET: &str = "test-secret";

/// Commit source that serves a fixed list and counts calls.
#[derive(Default)]
pub struct StaticCommitSource {
    commits: Mutex<Vec<GitHubCommit>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl StaticCommitSource {
    pub fn set_commits(&self, commits: Vec<GitHubCommit>) {
        *self.commits.lock().unwrap() = commits;
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommitSource for StaticCommitSource {
    async fn list_commits(&self, _repo: &RepoRef, _token: &str) -> ServiceResult<Vec<GitHubCommit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ServiceError::external_service(format!(
                "GitHub API error: {message}"
            )));
        }
        Ok(self.commits.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Mailer that keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: Mutex<bool>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        _html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(ServiceError::external_service("Failed to send email: refused"));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to_email.to_string(),
            subject: subject.to_string(),
            text: text_content.to_string(),
        });
        Ok(())
    }

    fn teams_url(&self) -> String {
        "http://localhost:5173/teams".to_string()
    }
}

pub struct TestApp {
    pub ctx: AppContext,
    pub store: Arc<InMemoryStore>,
    pub commits: Arc<StaticCommitSource>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let commits = Arc::new(StaticCommitSource::default());
        let mailer = Arc::new(RecordingMailer::default());

        let ctx = AppContext {
            teams: store.clone(),
            members: store.clone(),
            contributions: store.clone(),
            users: store.clone(),
            commits: commits.clone(),
            mailer: Some(mailer.clone()),
            jwt: Arc::new(JwtUtils::new(TEST_SECRET)),
        };

        Self {
            ctx,
            store,
            commits,
            mailer,
        }
    }

    /// Signed bearer token for `user_id`, valid for an hour.
    pub fn token(&self, user_id: &str, provider_token: Option<&str>) -> String {
        self.ctx
            .jwt
            .generate_token(user_id, None, provider_token, 3600)
            .unwrap()
    }
}

pub fn caller(user_id: &str, provider_token: Option<&str>) -> Caller {
    Caller {
        user_id: user_id.to_string(),
        email: None,
        provider_token: provider_token.map(str::to_string),
    }
}

pub fn commit_by(sha: &str, email: Option<&str>) -> GitHubCommit {
    GitHubCommit {
        sha: sha.to_string(),
        commit: CommitDetails {
            author: Some(CommitAuthor {
                name: Some("Dev".to_string()),
                email: email.map(str::to_string),
                date: None,
            }),
            message: format!("commit {sha}"),
        },
        html_url: format!("https://github.com/acme/widgets/commit/{sha}"),
    }
}
