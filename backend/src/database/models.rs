//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database, along with the request payloads accepted by the team
//! functions. Note that these may differ from API-specific models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Set when the account was provisioned by a team invitation.
    pub invited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Linked repository in `owner/repo` form.
    pub github_repo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
pub enum MemberRole {
    Admin,
    Member,
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberRole::Admin => write!(f, "Admin"),
            MemberRole::Member => write!(f, "Member"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Accepted,
    Declined,
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipStatus::Pending => write!(f, "pending"),
            MembershipStatus::Accepted => write!(f, "accepted"),
            MembershipStatus::Declined => write!(f, "declined"),
        }
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MembershipStatus::Pending),
            "accepted" => Ok(MembershipStatus::Accepted),
            "declined" => Ok(MembershipStatus::Declined),
            _ => Err(format!("Invalid membership status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub status: MembershipStatus,
    pub joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamContribution {
    pub team_id: String,
    pub user_id: String,
    pub commit_count: i64,
    pub last_synced_at: DateTime<Utc>,
}

/// One row of a contribution snapshot, before it is stamped and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionUpsert {
    pub team_id: String,
    pub user_id: String,
    pub commit_count: i64,
}

/// Contribution row joined with the member's email, as listed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSummary {
    pub user_id: String,
    pub email: String,
    pub commit_count: i64,
    pub last_synced_at: DateTime<Utc>,
}

// Request payloads. Fields are optional so that missing values surface as
// validation errors instead of extractor rejections.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTeamInviteRequest {
    pub team_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TeamInvite {
    #[validate(length(min = 1, message = "Team ID is required"))]
    pub team_id: String,
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncContributionsRequest {
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubProxyRequest {
    pub repo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TestEmailRequest {
    #[serde(alias = "toEmail")]
    #[validate(
        required(message = "A recipient email address is required"),
        email(message = "Must be a valid email")
    )]
    pub to_email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespondInvitationRequest {
    pub accept: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRepositoryRequest {
    pub github_repo: Option<String>,
}
