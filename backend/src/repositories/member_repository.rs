//! Database repository for team membership operations.
//!
//! Owns the `team_members` table: the is-admin predicate, invitation inserts
//! and status transitions.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{MemberRole, MembershipStatus, TeamMember};

/// Storage interface for team memberships.
#[async_trait]
pub trait TeamMemberRepository: Send + Sync {
    /// Whether the user holds an accepted `Admin` membership of the team.
    async fn is_admin_of(&self, team_id: &str, user_id: &str) -> Result<bool>;

    /// Retrieves the membership row for a (team, user) pair.
    async fn get_membership(&self, team_id: &str, user_id: &str) -> Result<Option<TeamMember>>;

    /// Retrieves a membership row by its identifier.
    async fn get_membership_by_id(&self, id: &str) -> Result<Option<TeamMember>>;

    /// Inserts a pending `Member` row, or resets a declined one.
    ///
    /// Returns `None` when a pending or accepted row already exists for the
    /// pair, which is how a concurrent invite that won the race shows up.
    async fn insert_pending_membership(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<TeamMember>>;

    /// Moves a pending membership to `status`. Returns the updated row, or
    /// `None` if the row was not pending anymore.
    async fn resolve_pending_membership(
        &self,
        id: &str,
        status: MembershipStatus,
        joined_at: Option<DateTime<Utc>>,
    ) -> Result<Option<TeamMember>>;

    /// Identifiers of every accepted member of the team.
    async fn get_accepted_member_ids(&self, team_id: &str) -> Result<Vec<String>>;
}

/// SQLite-backed membership repository.
pub struct SqliteTeamMemberRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl SqliteTeamMemberRepository {
    /// Creates a new SqliteTeamMemberRepository instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a membership with an explicit role and status. Used for seeding.
    #[cfg(test)]
    pub async fn create_membership(
        &self,
        team_id: &str,
        user_id: &str,
        role: MemberRole,
        status: MembershipStatus,
    ) -> Result<TeamMember> {
        let now = Utc::now();
        let joined_at = (status == MembershipStatus::Accepted).then_some(now);

        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (id, team_id, user_id, role, status, joined_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, team_id, user_id, role, status, joined_at, created_at
            "#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .bind(status)
        .bind(joined_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }
}

#[async_trait]
impl TeamMemberRepository for SqliteTeamMemberRepository {
    async fn is_admin_of(&self, team_id: &str, user_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM team_members
            WHERE team_id = ? AND user_id = ? AND role = 'Admin' AND status = 'accepted'
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn get_membership(&self, team_id: &str, user_id: &str) -> Result<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT id, team_id, user_id, role, status, joined_at, created_at
            FROM team_members WHERE team_id = ? AND user_id = ?
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn get_membership_by_id(&self, id: &str) -> Result<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT id, team_id, user_id, role, status, joined_at, created_at
            FROM team_members WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn insert_pending_membership(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (id, team_id, user_id, role, status, joined_at, created_at)
            VALUES (?, ?, ?, ?, ?, NULL, ?)
            ON CONFLICT (team_id, user_id) DO UPDATE SET
                role = excluded.role,
                status = excluded.status,
                joined_at = NULL,
                created_at = excluded.created_at
            WHERE team_members.status = 'declined'
            RETURNING id, team_id, user_id, role, status, joined_at, created_at
            "#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(team_id)
        .bind(user_id)
        .bind(MemberRole::Member)
        .bind(MembershipStatus::Pending)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn resolve_pending_membership(
        &self,
        id: &str,
        status: MembershipStatus,
        joined_at: Option<DateTime<Utc>>,
    ) -> Result<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            UPDATE team_members
            SET status = ?, joined_at = ?
            WHERE id = ? AND status = 'pending'
            RETURNING id, team_id, user_id, role, status, joined_at, created_at
            "#,
        )
        .bind(status)
        .bind(joined_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn get_accepted_member_ids(&self, team_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM team_members
            WHERE team_id = ? AND status = 'accepted'
            ORDER BY created_at
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_database;
    use crate::repositories::team_repository::SqliteTeamRepository;
    use crate::repositories::user_repository::SqliteUserRepository;

    struct Fixture {
        members: SqliteTeamMemberRepository,
        team_id: String,
        admin_id: String,
        other_id: String,
    }

    async fn fixture() -> Fixture {
        let db = test_database().await;
        let pool = db.pool().clone();
        let teams = SqliteTeamRepository::new(pool.clone());
        let users = SqliteUserRepository::new(pool.clone());
        let members = SqliteTeamMemberRepository::new(pool);

        teams
            .create_team("t1", "Core", None, None, Utc::now())
            .await
            .unwrap();
        let admin = users.create_user("admin@x.com").await.unwrap();
        let other = users.create_user("other@x.com").await.unwrap();
        members
            .create_membership("t1", &admin.id, MemberRole::Admin, MembershipStatus::Accepted)
            .await
            .unwrap();

        Fixture {
            members,
            team_id: "t1".to_string(),
            admin_id: admin.id,
            other_id: other.id,
        }
    }

    #[tokio::test]
    async fn test_is_admin_of() {
        let f = fixture().await;
        assert!(f.members.is_admin_of(&f.team_id, &f.admin_id).await.unwrap());
        assert!(!f.members.is_admin_of(&f.team_id, &f.other_id).await.unwrap());
        assert!(!f.members.is_admin_of("t2", &f.admin_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_admin_is_not_admin() {
        let f = fixture().await;
        f.members
            .create_membership(&f.team_id, &f.other_id, MemberRole::Admin, MembershipStatus::Pending)
            .await
            .unwrap();
        assert!(!f.members.is_admin_of(&f.team_id, &f.other_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_pending_membership_once() {
        let f = fixture().await;

        let first = f
            .members
            .insert_pending_membership(&f.team_id, &f.other_id)
            .await
            .unwrap()
            .expect("row inserted");
        assert_eq!(first.status, MembershipStatus::Pending);
        assert_eq!(first.role, MemberRole::Member);

        let second = f
            .members
            .insert_pending_membership(&f.team_id, &f.other_id)
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_declined_membership_is_reset() {
        let f = fixture().await;
        let declined = f
            .members
            .create_membership(&f.team_id, &f.other_id, MemberRole::Member, MembershipStatus::Declined)
            .await
            .unwrap();

        let reinvited = f
            .members
            .insert_pending_membership(&f.team_id, &f.other_id)
            .await
            .unwrap()
            .expect("declined row reset");
        assert_eq!(reinvited.id, declined.id);
        assert_eq!(reinvited.status, MembershipStatus::Pending);
    }

    #[tokio::test]
    async fn test_accepted_membership_not_overwritten() {
        let f = fixture().await;
        let result = f
            .members
            .insert_pending_membership(&f.team_id, &f.admin_id)
            .await
            .unwrap();
        assert!(result.is_none());

        let row = f
            .members
            .get_membership(&f.team_id, &f.admin_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, MembershipStatus::Accepted);
        assert_eq!(row.role, MemberRole::Admin);
    }

    #[tokio::test]
    async fn test_resolve_pending_membership() {
        let f = fixture().await;
        let pending = f
            .members
            .insert_pending_membership(&f.team_id, &f.other_id)
            .await
            .unwrap()
            .unwrap();

        let accepted = f
            .members
            .resolve_pending_membership(&pending.id, MembershipStatus::Accepted, Some(Utc::now()))
            .await
            .unwrap()
            .expect("pending row resolved");
        assert_eq!(accepted.status, MembershipStatus::Accepted);
        assert!(accepted.joined_at.is_some());

        let again = f
            .members
            .resolve_pending_membership(&pending.id, MembershipStatus::Declined, None)
            .await
            .unwrap();
        assert!(again.is_none());

        let mut ids = f.members.get_accepted_member_ids(&f.team_id).await.unwrap();
        ids.sort();
        let mut expected = vec![f.admin_id.clone(), f.other_id.clone()];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
