//! Database repository for synced GitHub contribution counts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::database::models::{ContributionSummary, ContributionUpsert};

/// Storage interface for per-member contribution counts.
#[async_trait]
pub trait ContributionRepository: Send + Sync {
    /// Writes every row in one atomic batch keyed on (team, user), stamping
    /// all of them with `synced_at`. Returns the number of rows written.
    async fn upsert_contributions(
        &self,
        rows: &[ContributionUpsert],
        synced_at: DateTime<Utc>,
    ) -> Result<u64>;

    /// Contribution rows joined with member emails, highest count first.
    async fn get_contribution_summaries(&self, team_id: &str) -> Result<Vec<ContributionSummary>>;
}

/// SQLite-backed contribution repository.
pub struct SqliteContributionRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl SqliteContributionRepository {
    /// Creates a new SqliteContributionRepository instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContributionRepository for SqliteContributionRepository {
    async fn upsert_contributions(
        &self,
        rows: &[ContributionUpsert],
        synced_at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for row in rows {
            written += sqlx::query(
                r#"
                INSERT INTO team_contributions (team_id, user_id, commit_count, last_synced_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (team_id, user_id) DO UPDATE SET
                    commit_count = excluded.commit_count,
                    last_synced_at = excluded.last_synced_at
                "#,
            )
            .bind(&row.team_id)
            .bind(&row.user_id)
            .bind(row.commit_count)
            .bind(synced_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        Ok(written)
    }

    async fn get_contribution_summaries(&self, team_id: &str) -> Result<Vec<ContributionSummary>> {
        let rows = sqlx::query_as::<_, ContributionSummary>(
            r#"
            SELECT c.user_id, u.email, c.commit_count, c.last_synced_at
            FROM team_contributions c
            JOIN users u ON u.id = c.user_id
            WHERE c.team_id = ?
            ORDER BY c.commit_count DESC, u.email
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
