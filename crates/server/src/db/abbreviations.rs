//! `PostgreSQL` abbreviation storage.

use async_trait::async_trait;
use tracing::instrument;

use super::{AbbreviationRepository, PgRepository, RepositoryError};

#[async_trait]
impl AbbreviationRepository for PgRepository {
    #[instrument(skip(self))]
    async fn list_abbreviations(&self) -> Result<Vec<String>, RepositoryError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM abbreviations ORDER BY created_at, name")
                .fetch_all(self.pool())
                .await?;
        Ok(names)
    }

    #[instrument(skip(self))]
    async fn insert_abbreviation(&self, name: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("INSERT INTO abbreviations (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(name)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
