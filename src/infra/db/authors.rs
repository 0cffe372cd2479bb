use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    AuthorsRepo, AuthorsWriteRepo, CreateAuthorParams, RepoError, UpdateAuthorParams,
};
use crate::domain::entities::AuthorRecord;

use super::{PostgresRepositories, map_sqlx_error};

const AUTHOR_COLUMNS: &str = "id, first_name, last_name, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: i64,
    first_name: String,
    last_name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AuthorRow> for AuthorRecord {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AuthorsRepo for PostgresRepositories {
    async fn list_all(&self) -> Result<Vec<AuthorRecord>, RepoError> {
        let rows = sqlx::query_as::<_, AuthorRow>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AuthorRecord::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AuthorRecord>, RepoError> {
        let row = sqlx::query_as::<_, AuthorRow>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorRecord::from))
    }
}

#[async_trait]
impl AuthorsWriteRepo for PostgresRepositories {
    async fn create_author(&self, params: CreateAuthorParams) -> Result<AuthorRecord, RepoError> {
        let row = sqlx::query_as::<_, AuthorRow>(&format!(
            "INSERT INTO authors (first_name, last_name) VALUES ($1, $2) \
             RETURNING {AUTHOR_COLUMNS}"
        ))
        .bind(params.first_name)
        .bind(params.last_name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_author(&self, params: UpdateAuthorParams) -> Result<AuthorRecord, RepoError> {
        let row = sqlx::query_as::<_, AuthorRow>(&format!(
            "UPDATE authors SET first_name = $2, last_name = $3, updated_at = now() \
             WHERE id = $1 RETURNING {AUTHOR_COLUMNS}"
        ))
        .bind(params.id)
        .bind(params.first_name)
        .bind(params.last_name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(AuthorRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_author(&self, id: i64) -> Result<bool, RepoError> {
        // Owned books go with the author via the FK cascade.
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
