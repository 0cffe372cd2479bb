//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{AuthorRecord, BookRecord, BookWithAuthor};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateAuthorParams {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct UpdateAuthorParams {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct CreateBookParams {
    pub title: String,
    pub cover_text: String,
    pub comment: Option<String>,
    pub author_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct UpdateBookParams {
    pub id: i64,
    pub title: String,
    pub cover_text: String,
    pub author_id: Option<i64>,
}

#[async_trait]
pub trait AuthorsRepo: Send + Sync {
    /// All authors in insertion (primary-key) order. Ordering must be stable
    /// across identical calls; list cache keys depend on it.
    async fn list_all(&self) -> Result<Vec<AuthorRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<AuthorRecord>, RepoError>;
}

#[async_trait]
pub trait AuthorsWriteRepo: Send + Sync {
    async fn create_author(&self, params: CreateAuthorParams) -> Result<AuthorRecord, RepoError>;

    async fn update_author(&self, params: UpdateAuthorParams) -> Result<AuthorRecord, RepoError>;

    /// Delete the author and, through the store's cascade, every book that
    /// references it. Returns false when no such author existed.
    async fn delete_author(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait BooksRepo: Send + Sync {
    /// All books with their owning author joined in, in insertion order.
    async fn list_all(&self) -> Result<Vec<BookWithAuthor>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<BookWithAuthor>, RepoError>;
}

#[async_trait]
pub trait BooksWriteRepo: Send + Sync {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError>;

    async fn update_book(&self, params: UpdateBookParams) -> Result<BookRecord, RepoError>;

    /// Returns false when no such book existed.
    async fn delete_book(&self, id: i64) -> Result<bool, RepoError>;
}
