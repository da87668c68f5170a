//! User directory backed by the `users` table.
//!
//! Provides lookup by email, provisioning of invited accounts and batch
//! resolution of user identifiers to accounts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::database::models::User;

/// Identity-provider style user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by email, ignoring ASCII case.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Provisions a pending account for an email that has never signed up.
    async fn invite_user_by_email(&self, email: &str) -> Result<User>;

    /// Resolves the given identifiers; unknown identifiers are skipped.
    async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>>;
}

/// SQLite-backed user directory.
pub struct SqliteUserRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Creates a new SqliteUserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a registered (non-invited) user.
    #[cfg(test)]
    pub async fn create_user(&self, email: &str) -> Result<User> {
        self.insert_user(email, None).await
    }

    async fn insert_user(&self, email: &str, invited_at: Option<DateTime<Utc>>) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, invited_at, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, email, invited_at, created_at
            "#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(email)
        .bind(invited_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserDirectory for SqliteUserRepository {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, invited_at, created_at
            FROM users WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn invite_user_by_email(&self, email: &str) -> Result<User> {
        self.insert_user(email, Some(Utc::now())).await
    }

    async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, email, invited_at, created_at FROM users WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_database;

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let db = test_database().await;
        let repo = SqliteUserRepository::new(db.pool().clone());
        let created = repo.create_user("dev@example.com").await.unwrap();

        let found = repo
            .get_user_by_email("DEV@Example.com")
            .await
            .unwrap()
            .expect("user found");
        assert_eq!(found.id, created.id);
        assert!(found.invited_at.is_none());
    }

    #[tokio::test]
    async fn test_invite_provisions_pending_account() {
        let db = test_database().await;
        let repo = SqliteUserRepository::new(db.pool().clone());

        let invited = repo.invite_user_by_email("new@example.com").await.unwrap();
        assert!(invited.invited_at.is_some());

        let found = repo.get_user_by_email("new@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(invited.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_database().await;
        let repo = SqliteUserRepository::new(db.pool().clone());
        repo.create_user("dup@example.com").await.unwrap();
        assert!(repo.invite_user_by_email("DUP@example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_get_users_by_ids() {
        let db = test_database().await;
        let repo = SqliteUserRepository::new(db.pool().clone());
        let a = repo.create_user("a@x.com").await.unwrap();
        let b = repo.create_user("b@x.com").await.unwrap();
        repo.create_user("c@x.com").await.unwrap();

        let mut users = repo
            .get_users_by_ids(&[a.id.clone(), b.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        users.sort_by(|x, y| x.email.cmp(&y.email));
        let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);

        assert!(repo.get_users_by_ids(&[]).await.unwrap().is_empty());
    }
}
