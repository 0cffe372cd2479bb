//! Book resource service: validation, persistence delegation, cache
//! invalidation, response shaping.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::application::auth::AuthContext;
use crate::application::pagination::{self, PageParams};
use crate::application::repos::{
    AuthorsRepo, BooksRepo, BooksWriteRepo, CreateBookParams, RepoError, UpdateBookParams,
};
use crate::application::shaping::{
    self, LinkBuilder, Route, add_admin_links, attach_admin_links_to_collection,
};
use crate::cache::{CacheTag, ListKey, ResponseCache};
use crate::domain::entities::{AuthorRecord, BookWithAuthor};
use crate::domain::types::ApiVersion;
use crate::domain::validate::{Violation, validate_book};

#[derive(Debug, Error)]
pub enum BookServiceError {
    #[error("book payload failed validation")]
    Validation(Vec<Violation>),
    #[error("book not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("shaping serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct CreateBookCommand {
    pub title: String,
    pub cover_text: String,
    pub comment: Option<String>,
    pub id_author: Option<i64>,
}

/// The mutable field set for updates: title, cover text, author reference.
/// `comment` and `id` are deliberately absent.
#[derive(Debug, Clone)]
pub struct UpdateBookCommand {
    pub id: i64,
    pub title: String,
    pub cover_text: String,
    pub id_author: Option<i64>,
}

pub struct BookService {
    reader: Arc<dyn BooksRepo>,
    writer: Arc<dyn BooksWriteRepo>,
    authors: Arc<dyn AuthorsRepo>,
    cache: Arc<ResponseCache>,
    links: Arc<LinkBuilder>,
}

impl BookService {
    pub fn new(
        reader: Arc<dyn BooksRepo>,
        writer: Arc<dyn BooksWriteRepo>,
        authors: Arc<dyn AuthorsRepo>,
        cache: Arc<ResponseCache>,
        links: Arc<LinkBuilder>,
    ) -> Self {
        Self {
            reader,
            writer,
            authors,
            cache,
            links,
        }
    }

    /// Serialized page of books. The cached body is role-free; admin links
    /// are attached after the cache step for granted callers.
    pub async fn list(
        &self,
        params: PageParams,
        version: ApiVersion,
        auth: &AuthContext,
    ) -> Result<String, BookServiceError> {
        let key = ListKey::books(version, params);
        let body = self
            .cache
            .get_or_compute(&key, CacheTag::Books, || async {
                let all = self.reader.list_all().await?;
                let shaped: Vec<Value> = pagination::window(&all, params)
                    .iter()
                    .map(|entry| shaping::shape_book(entry, version, &self.links))
                    .collect();
                serde_json::to_string(&shaped).map_err(BookServiceError::from)
            })
            .await?;

        attach_admin_links_to_collection(&body, Route::BookDetail, &self.links, auth)
            .map_err(BookServiceError::from)
    }

    /// Detail view, always fetched fresh (never cached).
    pub async fn get(
        &self,
        id: i64,
        version: ApiVersion,
        auth: &AuthContext,
    ) -> Result<Value, BookServiceError> {
        let entry = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(BookServiceError::NotFound)?;
        let mut shaped = shaping::shape_book(&entry, version, &self.links);
        add_admin_links(&mut shaped, Route::BookDetail, &self.links, auth);
        Ok(shaped)
    }

    /// Create a book. Returns the shaped entity and the canonical location
    /// of its detail route.
    pub async fn create(
        &self,
        command: CreateBookCommand,
        version: ApiVersion,
        auth: &AuthContext,
    ) -> Result<(Value, String), BookServiceError> {
        let violations = validate_book(&command.title, &command.cover_text);
        if !violations.is_empty() {
            return Err(BookServiceError::Validation(violations));
        }

        let author = self.resolve_author(command.id_author).await?;
        let record = self
            .writer
            .create_book(CreateBookParams {
                title: command.title,
                cover_text: command.cover_text,
                comment: command.comment,
                author_id: author.as_ref().map(|a| a.id),
            })
            .await?;
        self.cache.invalidate_tag(CacheTag::Books);

        let location = self.links.url_for(Route::BookDetail, record.id);
        let entry = BookWithAuthor {
            book: record,
            author,
        };
        let mut shaped = shaping::shape_book(&entry, version, &self.links);
        add_admin_links(&mut shaped, Route::BookDetail, &self.links, auth);
        Ok((shaped, location))
    }

    /// Overwrite the mutable field set of an existing book.
    pub async fn update(&self, command: UpdateBookCommand) -> Result<(), BookServiceError> {
        let existing = self
            .reader
            .find_by_id(command.id)
            .await?
            .ok_or(BookServiceError::NotFound)?;

        let violations = validate_book(&command.title, &command.cover_text);
        if !violations.is_empty() {
            return Err(BookServiceError::Validation(violations));
        }

        let author = self.resolve_author(command.id_author).await?;
        self.writer
            .update_book(UpdateBookParams {
                id: existing.book.id,
                title: command.title,
                cover_text: command.cover_text,
                author_id: author.map(|a| a.id),
            })
            .await?;
        self.cache.invalidate_tag(CacheTag::Books);
        Ok(())
    }

    /// Delete a book. The tag is invalidated before the row goes away so a
    /// concurrent list cannot re-cache the doomed entity between the two
    /// steps and survive past them.
    pub async fn delete(&self, id: i64) -> Result<(), BookServiceError> {
        if self.reader.find_by_id(id).await?.is_none() {
            return Err(BookServiceError::NotFound);
        }
        self.cache.invalidate_tag(CacheTag::Books);
        if !self.writer.delete_book(id).await? {
            return Err(BookServiceError::NotFound);
        }
        Ok(())
    }

    /// Resolve a payload-supplied author reference. An id that does not
    /// resolve leaves the association unset rather than failing the request.
    async fn resolve_author(
        &self,
        id_author: Option<i64>,
    ) -> Result<Option<AuthorRecord>, BookServiceError> {
        let Some(id) = id_author else {
            return Ok(None);
        };
        let author = self.authors.find_by_id(id).await?;
        if author.is_none() {
            warn!(
                target: "libris::books",
                id_author = id,
                "author reference did not resolve; leaving association unset"
            );
        }
        Ok(author)
    }
}
