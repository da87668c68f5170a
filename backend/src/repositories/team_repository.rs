//! Database repository for team lookups.
//!
//! Teams are created and deleted elsewhere; the functions only read them and
//! maintain the linked GitHub repository.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::database::models::Team;

/// Storage interface for teams.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Retrieves a team by its unique identifier.
    async fn get_team_by_id(&self, id: &str) -> Result<Option<Team>>;

    /// Sets or clears the linked repository. Returns `false` if no team matched.
    async fn update_github_repo(&self, id: &str, github_repo: Option<&str>) -> Result<bool>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl SqliteTeamRepository {
    /// Creates a new SqliteTeamRepository instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a team. Used for seeding; the application never creates teams.
    #[cfg(test)]
    pub async fn create_team(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        github_repo: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Team> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (id, name, description, github_repo, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, description, github_repo, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(github_repo)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(team)
    }
}

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    async fn get_team_by_id(&self, id: &str) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, description, github_repo, created_at
            FROM teams WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn update_github_repo(&self, id: &str, github_repo: Option<&str>) -> Result<bool> {
        let rows_affected = sqlx::query("UPDATE teams SET github_repo = ? WHERE id = ?")
            .bind(github_repo)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_database;

    #[tokio::test]
    async fn test_get_and_update_repo() {
        let db = test_database().await;
        let repo = SqliteTeamRepository::new(db.pool().clone());
        repo.create_team("t1", "Core", Some("Core team"), None, Utc::now())
            .await
            .unwrap();

        let team = repo.get_team_by_id("t1").await.unwrap().unwrap();
        assert_eq!(team.name, "Core");
        assert!(team.github_repo.is_none());

        assert!(repo.update_github_repo("t1", Some("acme/widgets")).await.unwrap());
        let team = repo.get_team_by_id("t1").await.unwrap().unwrap();
        assert_eq!(team.github_repo.as_deref(), Some("acme/widgets"));

        assert!(repo.update_github_repo("t1", None).await.unwrap());
        let team = repo.get_team_by_id("t1").await.unwrap().unwrap();
        assert!(team.github_repo.is_none());
    }

    #[tokio::test]
    async fn test_missing_team() {
        let db = test_database().await;
        let repo = SqliteTeamRepository::new(db.pool().clone());
        assert!(repo.get_team_by_id("nope").await.unwrap().is_none());
        assert!(!repo.update_github_repo("nope", Some("a/b")).await.unwrap());
    }
}
