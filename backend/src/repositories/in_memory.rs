//! In-process implementation of every repository interface.
//!
//! Backs the `STORAGE_BACKEND=memory` demo mode and the service tests. The
//! store has an explicit lifecycle: build it with [`InMemoryStore::new`],
//! seed it, and wipe it with [`InMemoryStore::reset`].

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    ContributionSummary, ContributionUpsert, MemberRole, MembershipStatus, Team, TeamContribution,
    TeamMember, User,
};
use crate::repositories::contribution_repository::ContributionRepository;
use crate::repositories::member_repository::TeamMemberRepository;
use crate::repositories::team_repository::TeamRepository;
use crate::repositories::user_repository::UserDirectory;

#[derive(Debug, Default)]
struct StoreState {
    users: Vec<User>,
    teams: HashMap<String, Team>,
    members: Vec<TeamMember>,
    contributions: HashMap<(String, String), TeamContribution>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every user, team, membership and contribution.
    pub async fn reset(&self) {
        *self.state.write().await = StoreState::default();
    }

    pub async fn seed_user(&self, email: &str) -> User {
        let user = User {
            id: Uuid::now_v7().to_string(),
            email: email.to_string(),
            invited_at: None,
            created_at: Utc::now(),
        };
        self.state.write().await.users.push(user.clone());
        user
    }

    pub async fn seed_team(&self, name: &str, github_repo: Option<&str>) -> Team {
        let team = Team {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            description: None,
            github_repo: github_repo.map(str::to_string),
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .teams
            .insert(team.id.clone(), team.clone());
        team
    }

    pub async fn seed_membership(
        &self,
        team_id: &str,
        user_id: &str,
        role: MemberRole,
        status: MembershipStatus,
    ) -> TeamMember {
        let now = Utc::now();
        let member = TeamMember {
            id: Uuid::now_v7().to_string(),
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
            role,
            status,
            joined_at: (status == MembershipStatus::Accepted).then_some(now),
            created_at: now,
        };
        self.state.write().await.members.push(member.clone());
        member
    }

    /// Every membership row of a team.
    #[cfg(test)]
    pub async fn memberships(&self, team_id: &str) -> Vec<TeamMember> {
        self.state
            .read()
            .await
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// Replaces the store contents with a demo team owned by a demo admin.
    pub async fn seed_demo(&self) -> (User, Team) {
        self.reset().await;
        let admin = self.seed_user("admin@collabmate.dev").await;
        let team = self.seed_team("Demo Team", None).await;
        self.seed_membership(&team.id, &admin.id, MemberRole::Admin, MembershipStatus::Accepted)
            .await;
        (admin, team)
    }
}

#[async_trait]
impl TeamRepository for InMemoryStore {
    async fn get_team_by_id(&self, id: &str) -> Result<Option<Team>> {
        Ok(self.state.read().await.teams.get(id).cloned())
    }

    async fn update_github_repo(&self, id: &str, github_repo: Option<&str>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.teams.get_mut(id) {
            Some(team) => {
                team.github_repo = github_repo.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn invite_user_by_email(&self, email: &str) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            bail!("UNIQUE constraint failed: users.email");
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7().to_string(),
            email: email.to_string(),
            invited_at: Some(now),
            created_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TeamMemberRepository for InMemoryStore {
    async fn is_admin_of(&self, team_id: &str, user_id: &str) -> Result<bool> {
        Ok(self.state.read().await.members.iter().any(|m| {
            m.team_id == team_id
                && m.user_id == user_id
                && m.role == MemberRole::Admin
                && m.status == MembershipStatus::Accepted
        }))
    }

    async fn get_membership(&self, team_id: &str, user_id: &str) -> Result<Option<TeamMember>> {
        Ok(self
            .state
            .read()
            .await
            .members
            .iter()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .cloned())
    }

    async fn get_membership_by_id(&self, id: &str) -> Result<Option<TeamMember>> {
        Ok(self
            .state
            .read()
            .await
            .members
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn insert_pending_membership(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<TeamMember>> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Some(existing) = state
            .members
            .iter_mut()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
        {
            if existing.status != MembershipStatus::Declined {
                return Ok(None);
            }
            existing.role = MemberRole::Member;
            existing.status = MembershipStatus::Pending;
            existing.joined_at = None;
            existing.created_at = now;
            return Ok(Some(existing.clone()));
        }

        let member = TeamMember {
            id: Uuid::now_v7().to_string(),
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
            role: MemberRole::Member,
            status: MembershipStatus::Pending,
            joined_at: None,
            created_at: now,
        };
        state.members.push(member.clone());
        Ok(Some(member))
    }

    async fn resolve_pending_membership(
        &self,
        id: &str,
        status: MembershipStatus,
        joined_at: Option<DateTime<Utc>>,
    ) -> Result<Option<TeamMember>> {
        let mut state = self.state.write().await;
        match state
            .members
            .iter_mut()
            .find(|m| m.id == id && m.status == MembershipStatus::Pending)
        {
            Some(member) => {
                member.status = status;
                member.joined_at = joined_at;
                Ok(Some(member.clone()))
            }
            None => Ok(None),
        }
    }

    async fn get_accepted_member_ids(&self, team_id: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .read()
            .await
            .members
            .iter()
            .filter(|m| m.team_id == team_id && m.status == MembershipStatus::Accepted)
            .map(|m| m.user_id.clone())
            .collect())
    }
}

#[async_trait]
impl ContributionRepository for InMemoryStore {
    async fn upsert_contributions(
        &self,
        rows: &[ContributionUpsert],
        synced_at: DateTime<Utc>,
    ) -> Result<u64> {
        if let Some(bad) = rows.iter().find(|r| r.commit_count < 0) {
            bail!("CHECK constraint failed: commit_count for {}", bad.user_id);
        }

        let mut state = self.state.write().await;
        for row in rows {
            state.contributions.insert(
                (row.team_id.clone(), row.user_id.clone()),
                TeamContribution {
                    team_id: row.team_id.clone(),
                    user_id: row.user_id.clone(),
                    commit_count: row.commit_count,
                    last_synced_at: synced_at,
                },
            );
        }

        Ok(rows.len() as u64)
    }

    async fn get_contribution_summaries(&self, team_id: &str) -> Result<Vec<ContributionSummary>> {
        let state = self.state.read().await;
        let mut rows: Vec<ContributionSummary> = state
            .contributions
            .values()
            .filter(|c| c.team_id == team_id)
            .filter_map(|c| {
                let user = state.users.iter().find(|u| u.id == c.user_id)?;
                Some(ContributionSummary {
                    user_id: c.user_id.clone(),
                    email: user.email.clone(),
                    commit_count: c.commit_count,
                    last_synced_at: c.last_synced_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.commit_count
                .cmp(&a.commit_count)
                .then_with(|| a.email.cmp(&b.email))
        });
        Ok(rows)
    }
}
