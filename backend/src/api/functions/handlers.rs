//! Handler functions for the team function endpoints.
//!
//! Each handler unwraps the body and the resolved caller, runs the matching
//! service and turns the outcome into JSON.

use crate::api::common::{ApiError, MessageResponse, parse_body, service_error_to_http};
use crate::auth::models::Caller;
use crate::database::models::{
    GitHubProxyRequest, SendTeamInviteRequest, SyncContributionsRequest, TestEmailRequest,
};
use crate::services::context::AppContext;
use crate::services::contribution_service::ContributionSyncService;
use crate::services::email_service::send_test_email;
use crate::services::github_service::{GitHubCommit, GitHubProxyService};
use crate::services::invite_service::TeamInviteService;
use axum::extract::{Extension, Json, rejection::JsonRejection};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub message: String,
    pub commits_processed: usize,
    pub members_updated: u64,
    pub last_synced_at: DateTime<Utc>,
}

/// Handle team invitation request
#[axum::debug_handler]
pub async fn send_team_invite(
    Extension(ctx): Extension<AppContext>,
    Extension(caller): Extension<Option<Caller>>,
    payload: Result<Json<SendTeamInviteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = parse_body(payload).map_err(service_error_to_http)?;

    let membership = TeamInviteService::new(&ctx)
        .send_invite(request, caller)
        .await
        .map_err(|e| {
            tracing::error!("Failed to send team invite: {}", e);
            service_error_to_http(e)
        })?;

    tracing::info!("Invitation {} created", membership.id);
    Ok(Json(MessageResponse::new("Invitation sent successfully.")))
}

/// Handle contribution sync request
#[axum::debug_handler]
pub async fn sync_github_contributions(
    Extension(ctx): Extension<AppContext>,
    Extension(caller): Extension<Option<Caller>>,
    payload: Result<Json<SyncContributionsRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, ApiError> {
    let request = parse_body(payload).map_err(service_error_to_http)?;

    let outcome = ContributionSyncService::new(&ctx)
        .sync(request, caller)
        .await
        .map_err(|e| {
            tracing::error!("Contribution sync failed: {}", e);
            service_error_to_http(e)
        })?;

    Ok(Json(SyncResponse {
        message: format!(
            "Sync complete. Processed {} commits.",
            outcome.commits_processed
        ),
        commits_processed: outcome.commits_processed,
        members_updated: outcome.members_updated,
        last_synced_at: outcome.synced_at,
    }))
}

/// Relay a repository's commits using the caller's GitHub token
#[axum::debug_handler]
pub async fn github_proxy(
    Extension(ctx): Extension<AppContext>,
    Extension(caller): Extension<Option<Caller>>,
    payload: Result<Json<GitHubProxyRequest>, JsonRejection>,
) -> Result<Json<Vec<GitHubCommit>>, ApiError> {
    let request = parse_body(payload).map_err(service_error_to_http)?;

    let commits = GitHubProxyService::new(&ctx)
        .list_commits(request, caller)
        .await
        .map_err(|e| {
            tracing::error!("GitHub proxy request failed: {}", e);
            service_error_to_http(e)
        })?;

    Ok(Json(commits))
}

#[axum::debug_handler]
pub async fn test_email(
    Extension(ctx): Extension<AppContext>,
    Extension(caller): Extension<Option<Caller>>,
    payload: Result<Json<TestEmailRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = parse_body(payload).map_err(service_error_to_http)?;

    send_test_email(&ctx, request, caller).await.map_err(|e| {
        tracing::error!("Test email failed: {}", e);
        service_error_to_http(e)
    })?;

    Ok(Json(MessageResponse::new("Test email sent successfully!")))
}
