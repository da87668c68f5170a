//! Team invitation business logic.
//!
//! Handles sending invitations to a team and the invitee's answer to them.

use chrono::Utc;
use validator::Validate;

use crate::auth::models::Caller;
use crate::database::models::{
    MembershipStatus, RespondInvitationRequest, SendTeamInviteRequest, Team, TeamInvite,
    TeamMember, User,
};
use crate::errors::{MISSING_CREDENTIALS, ServiceError, ServiceResult};
use crate::services::authorization_service::AuthorizationService;
use crate::services::context::AppContext;
use crate::services::email_service::InviteEmail;
use crate::utils::normalize_email;

const INVITE_DENIED: &str = "You must be an admin to invite members.";
const ALREADY_MEMBER: &str = "User is already a member of this team.";
const ALREADY_INVITED: &str = "User already has a pending invitation to this team.";
const DIRECTORY_UNAVAILABLE: &str = "Could not resolve the invited user. Please try again.";

pub struct TeamInviteService<'a> {
    ctx: &'a AppContext,
}

impl<'a> TeamInviteService<'a> {
    /// Creates a new TeamInviteService instance.
    ///
    /// # Arguments
    /// * `ctx` - Shared repositories and clients
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Invites `email` to a team as a pending `Member`.
    ///
    /// Unknown emails get a pending account provisioned. The notification
    /// email is sent after the membership is written and its failure does
    /// not fail the invitation.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Missing or malformed team id / email
    /// - Missing caller, or a caller who is not an admin of the team
    /// - Unknown team
    /// - An accepted or pending membership for the invitee
    pub async fn send_invite(
        &self,
        request: SendTeamInviteRequest,
        caller: Option<Caller>,
    ) -> ServiceResult<TeamMember> {
        let invite = match (request.team_id, request.email) {
            (Some(team_id), Some(email)) if !team_id.trim().is_empty() && !email.trim().is_empty() => {
                TeamInvite {
                    team_id: team_id.trim().to_string(),
                    email: normalize_email(&email),
                }
            }
            _ => return Err(ServiceError::validation("Team ID and email are required.")),
        };

        invite
            .validate()
            .map_err(|e| ServiceError::from_validation_errors(&e))?;

        let caller = caller.ok_or_else(|| ServiceError::authentication(MISSING_CREDENTIALS))?;

        AuthorizationService::new(self.ctx.members.as_ref())
            .require_team_admin(&invite.team_id, &caller.user_id, INVITE_DENIED)
            .await?;

        let team = self
            .ctx
            .teams
            .get_team_by_id(&invite.team_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Team", &invite.team_id))?;

        let invitee = self.resolve_invitee(&invite.email).await?;

        if let Some(existing) = self
            .ctx
            .members
            .get_membership(&team.id, &invitee.id)
            .await?
        {
            match existing.status {
                MembershipStatus::Accepted => return Err(ServiceError::conflict(ALREADY_MEMBER)),
                MembershipStatus::Pending => return Err(ServiceError::conflict(ALREADY_INVITED)),
                MembershipStatus::Declined => {
                    tracing::info!(
                        "Re-inviting {} to team {} after a declined invitation",
                        invitee.email,
                        team.id
                    );
                }
            }
        }

        let membership = match self
            .ctx
            .members
            .insert_pending_membership(&team.id, &invitee.id)
            .await?
        {
            Some(membership) => membership,
            // Another invite for the same pair landed between our read and write.
            None => return Err(self.conflict_for(&team.id, &invitee.id).await),
        };

        tracing::info!(
            "User {} invited {} to team {}",
            caller.user_id,
            invitee.email,
            team.id
        );

        self.try_send_invite_email(&team, &invitee, &caller).await;

        Ok(membership)
    }

    /// Accepts or declines the caller's own pending invitation.
    pub async fn respond_to_invitation(
        &self,
        membership_id: &str,
        request: RespondInvitationRequest,
        caller: Option<Caller>,
    ) -> ServiceResult<TeamMember> {
        let accept = request
            .accept
            .ok_or_else(|| ServiceError::validation("accept: A decision is required"))?;

        let caller = caller.ok_or_else(|| ServiceError::authentication(MISSING_CREDENTIALS))?;

        let membership = self
            .ctx
            .members
            .get_membership_by_id(membership_id)
            .await?
            .filter(|m| m.user_id == caller.user_id)
            .ok_or_else(|| ServiceError::not_found("Invitation", membership_id))?;

        if membership.status != MembershipStatus::Pending {
            return Err(ServiceError::conflict(format!(
                "Invitation has already been {}.",
                membership.status
            )));
        }

        let (status, joined_at) = if accept {
            (MembershipStatus::Accepted, Some(Utc::now()))
        } else {
            (MembershipStatus::Declined, None)
        };

        let updated = self
            .ctx
            .members
            .resolve_pending_membership(membership_id, status, joined_at)
            .await?
            .ok_or_else(|| ServiceError::conflict("Invitation has already been answered."))?;

        tracing::info!(
            "User {} {} invitation to team {}",
            caller.user_id,
            updated.status,
            updated.team_id
        );

        Ok(updated)
    }

    /// Finds the invitee's account, provisioning a pending one if needed.
    async fn resolve_invitee(&self, email: &str) -> ServiceResult<User> {
        if let Some(user) = self.find_user(email).await? {
            return Ok(user);
        }

        match self.ctx.users.invite_user_by_email(email).await {
            Ok(user) => {
                tracing::info!("Provisioned pending account for {}", email);
                Ok(user)
            }
            Err(e) => {
                // A concurrent invite may have created the account first.
                if let Some(user) = self.find_user(email).await? {
                    return Ok(user);
                }
                tracing::error!("Failed to provision account for {}: {}", email, e);
                Err(ServiceError::external_service(DIRECTORY_UNAVAILABLE))
            }
        }
    }

    async fn find_user(&self, email: &str) -> ServiceResult<Option<User>> {
        self.ctx.users.get_user_by_email(email).await.map_err(|e| {
            tracing::error!("User directory lookup failed for {}: {}", email, e);
            ServiceError::external_service(DIRECTORY_UNAVAILABLE)
        })
    }

    async fn conflict_for(&self, team_id: &str, user_id: &str) -> ServiceError {
        match self.ctx.members.get_membership(team_id, user_id).await {
            Ok(Some(m)) if m.status == MembershipStatus::Accepted => {
                ServiceError::conflict(ALREADY_MEMBER)
            }
            _ => ServiceError::conflict(ALREADY_INVITED),
        }
    }

    /// Attempts to send an invite email, logging but not failing if email service is unavailable
    async fn try_send_invite_email(&self, team: &Team, invitee: &User, inviter: &Caller) {
        let Some(mailer) = self.ctx.mailer.as_ref() else {
            tracing::warn!(
                "Email service not configured. Invite email not sent to {}",
                invitee.email
            );
            return;
        };

        let inviter_name = inviter.email.as_deref().unwrap_or("A teammate");
        let email = InviteEmail::new(&team.name, inviter_name, &mailer.teams_url());

        match mailer
            .send_email(&invitee.email, &email.subject, &email.html, &email.text)
            .await
        {
            Ok(()) => tracing::info!("Invite email sent successfully to {}", invitee.email),
            Err(e) => tracing::error!("Failed to send invite email to {}: {}", invitee.email, e),
        }
    }
}
