//! Handler functions for team endpoints.

use crate::api::common::{ApiError, parse_body, service_error_to_http};
use crate::auth::models::Caller;
use crate::database::models::{ContributionSummary, Team, UpdateTeamRepositoryRequest};
use crate::services::context::AppContext;
use crate::services::contribution_service::ContributionSyncService;
use crate::services::team_service::TeamService;
use axum::extract::{Extension, Json, Path, rejection::JsonRejection};

/// Links or unlinks the team's GitHub repository.
#[axum::debug_handler]
pub async fn update_team_repository(
    Extension(ctx): Extension<AppContext>,
    Extension(caller): Extension<Option<Caller>>,
    Path(team_id): Path<String>,
    payload: Result<Json<UpdateTeamRepositoryRequest>, JsonRejection>,
) -> Result<Json<Team>, ApiError> {
    let request = parse_body(payload).map_err(service_error_to_http)?;

    let team = TeamService::new(&ctx)
        .update_repository(&team_id, request, caller)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update repository for team {}: {}", team_id, e);
            service_error_to_http(e)
        })?;

    Ok(Json(team))
}

/// Lists the team's latest contribution snapshot.
#[axum::debug_handler]
pub async fn get_team_contributions(
    Extension(ctx): Extension<AppContext>,
    Extension(caller): Extension<Option<Caller>>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<ContributionSummary>>, ApiError> {
    let rows = ContributionSyncService::new(&ctx)
        .list_contributions(&team_id, caller)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(rows))
}
