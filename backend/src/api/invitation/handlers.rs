//! Handler functions for answering team invitations.

use crate::api::common::{ApiError, parse_body, service_error_to_http};
use crate::auth::models::Caller;
use crate::database::models::{RespondInvitationRequest, TeamMember};
use crate::services::context::AppContext;
use crate::services::invite_service::TeamInviteService;
use axum::extract::{Extension, Json, Path, rejection::JsonRejection};

/// Accepts or declines the caller's pending invitation.
#[axum::debug_handler]
pub async fn respond_to_invitation(
    Extension(ctx): Extension<AppContext>,
    Extension(caller): Extension<Option<Caller>>,
    Path(membership_id): Path<String>,
    payload: Result<Json<RespondInvitationRequest>, JsonRejection>,
) -> Result<Json<TeamMember>, ApiError> {
    let request = parse_body(payload).map_err(service_error_to_http)?;

    let membership = TeamInviteService::new(&ctx)
        .respond_to_invitation(&membership_id, request, caller)
        .await
        .map_err(|e| {
            tracing::error!("Failed to answer invitation {}: {}", membership_id, e);
            service_error_to_http(e)
        })?;

    Ok(Json(membership))
}
