use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    BooksRepo, BooksWriteRepo, CreateBookParams, RepoError, UpdateBookParams,
};
use crate::domain::entities::{AuthorRecord, BookRecord, BookWithAuthor};

use super::{PostgresRepositories, map_sqlx_error};

const BOOK_COLUMNS: &str = "id, title, cover_text, comment, author_id, created_at, updated_at";

/// Book columns plus the joined author, aliased so a single row carries both
/// sides. The author side is NULL for books whose reference never resolved.
const BOOK_WITH_AUTHOR_SELECT: &str = "SELECT \
     b.id, b.title, b.cover_text, b.comment, b.author_id, b.created_at, b.updated_at, \
     a.first_name AS author_first_name, a.last_name AS author_last_name, \
     a.created_at AS author_created_at, a.updated_at AS author_updated_at \
     FROM books b LEFT JOIN authors a ON a.id = b.author_id";

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    cover_text: String,
    comment: Option<String>,
    author_id: Option<i64>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<BookRow> for BookRecord {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            cover_text: row.cover_text,
            comment: row.comment,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookWithAuthorRow {
    id: i64,
    title: String,
    cover_text: String,
    comment: Option<String>,
    author_id: Option<i64>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
    author_created_at: Option<OffsetDateTime>,
    author_updated_at: Option<OffsetDateTime>,
}

impl From<BookWithAuthorRow> for BookWithAuthor {
    fn from(row: BookWithAuthorRow) -> Self {
        let author = match (
            row.author_id,
            row.author_first_name,
            row.author_last_name,
            row.author_created_at,
            row.author_updated_at,
        ) {
            (Some(id), Some(first_name), Some(last_name), Some(created_at), Some(updated_at)) => {
                Some(AuthorRecord {
                    id,
                    first_name,
                    last_name,
                    created_at,
                    updated_at,
                })
            }
            _ => None,
        };

        Self {
            book: BookRecord {
                id: row.id,
                title: row.title,
                cover_text: row.cover_text,
                comment: row.comment,
                author_id: row.author_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author,
        }
    }
}

#[async_trait]
impl BooksRepo for PostgresRepositories {
    async fn list_all(&self) -> Result<Vec<BookWithAuthor>, RepoError> {
        let rows = sqlx::query_as::<_, BookWithAuthorRow>(&format!(
            "{BOOK_WITH_AUTHOR_SELECT} ORDER BY b.id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(BookWithAuthor::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<BookWithAuthor>, RepoError> {
        let row = sqlx::query_as::<_, BookWithAuthorRow>(&format!(
            "{BOOK_WITH_AUTHOR_SELECT} WHERE b.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(BookWithAuthor::from))
    }
}

#[async_trait]
impl BooksWriteRepo for PostgresRepositories {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "INSERT INTO books (title, cover_text, comment, author_id) \
             VALUES ($1, $2, $3, $4) RETURNING {BOOK_COLUMNS}"
        ))
        .bind(params.title)
        .bind(params.cover_text)
        .bind(params.comment)
        .bind(params.author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_book(&self, params: UpdateBookParams) -> Result<BookRecord, RepoError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "UPDATE books SET title = $2, cover_text = $3, author_id = $4, updated_at = now() \
             WHERE id = $1 RETURNING {BOOK_COLUMNS}"
        ))
        .bind(params.id)
        .bind(params.title)
        .bind(params.cover_text)
        .bind(params.author_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(BookRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_book(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
