//! Author resource service.
//!
//! Author writes invalidate both cache tags: book list bodies embed author
//! data, so any change to an author can change serialized book output.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::application::auth::AuthContext;
use crate::application::pagination::{self, PageParams};
use crate::application::repos::{
    AuthorsRepo, AuthorsWriteRepo, CreateAuthorParams, RepoError, UpdateAuthorParams,
};
use crate::application::shaping::{
    self, LinkBuilder, Route, add_admin_links, attach_admin_links_to_collection,
};
use crate::cache::{CacheTag, ListKey, ResponseCache};
use crate::domain::types::ApiVersion;
use crate::domain::validate::{Violation, validate_author};

#[derive(Debug, Error)]
pub enum AuthorServiceError {
    #[error("author payload failed validation")]
    Validation(Vec<Violation>),
    #[error("author not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("shaping serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct CreateAuthorCommand {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct UpdateAuthorCommand {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

pub struct AuthorService {
    reader: Arc<dyn AuthorsRepo>,
    writer: Arc<dyn AuthorsWriteRepo>,
    cache: Arc<ResponseCache>,
    links: Arc<LinkBuilder>,
}

impl AuthorService {
    pub fn new(
        reader: Arc<dyn AuthorsRepo>,
        writer: Arc<dyn AuthorsWriteRepo>,
        cache: Arc<ResponseCache>,
        links: Arc<LinkBuilder>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            links,
        }
    }

    pub async fn list(
        &self,
        params: PageParams,
        version: ApiVersion,
        auth: &AuthContext,
    ) -> Result<String, AuthorServiceError> {
        let key = ListKey::authors(version, params);
        let body = self
            .cache
            .get_or_compute(&key, CacheTag::Authors, || async {
                let all = self.reader.list_all().await?;
                let shaped: Vec<Value> = pagination::window(&all, params)
                    .iter()
                    .map(|author| shaping::shape_author(author, version, &self.links))
                    .collect();
                serde_json::to_string(&shaped).map_err(AuthorServiceError::from)
            })
            .await?;

        attach_admin_links_to_collection(&body, Route::AuthorDetail, &self.links, auth)
            .map_err(AuthorServiceError::from)
    }

    pub async fn get(
        &self,
        id: i64,
        version: ApiVersion,
        auth: &AuthContext,
    ) -> Result<Value, AuthorServiceError> {
        let author = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(AuthorServiceError::NotFound)?;
        let mut shaped = shaping::shape_author(&author, version, &self.links);
        add_admin_links(&mut shaped, Route::AuthorDetail, &self.links, auth);
        Ok(shaped)
    }

    pub async fn create(
        &self,
        command: CreateAuthorCommand,
        version: ApiVersion,
        auth: &AuthContext,
    ) -> Result<(Value, String), AuthorServiceError> {
        let violations = validate_author(&command.first_name, &command.last_name);
        if !violations.is_empty() {
            return Err(AuthorServiceError::Validation(violations));
        }

        let record = self
            .writer
            .create_author(CreateAuthorParams {
                first_name: command.first_name,
                last_name: command.last_name,
            })
            .await?;
        self.invalidate();

        let location = self.links.url_for(Route::AuthorDetail, record.id);
        let mut shaped = shaping::shape_author(&record, version, &self.links);
        add_admin_links(&mut shaped, Route::AuthorDetail, &self.links, auth);
        Ok((shaped, location))
    }

    /// Overwrite the mutable field set: first and last name only.
    pub async fn update(&self, command: UpdateAuthorCommand) -> Result<(), AuthorServiceError> {
        let existing = self
            .reader
            .find_by_id(command.id)
            .await?
            .ok_or(AuthorServiceError::NotFound)?;

        let violations = validate_author(&command.first_name, &command.last_name);
        if !violations.is_empty() {
            return Err(AuthorServiceError::Validation(violations));
        }

        self.writer
            .update_author(UpdateAuthorParams {
                id: existing.id,
                first_name: command.first_name,
                last_name: command.last_name,
            })
            .await?;
        self.invalidate();
        Ok(())
    }

    /// Delete an author; the store cascades the delete to every owned book.
    /// Both tags are invalidated before the row goes away.
    pub async fn delete(&self, id: i64) -> Result<(), AuthorServiceError> {
        if self.reader.find_by_id(id).await?.is_none() {
            return Err(AuthorServiceError::NotFound);
        }
        self.invalidate();
        if !self.writer.delete_author(id).await? {
            return Err(AuthorServiceError::NotFound);
        }
        Ok(())
    }

    fn invalidate(&self) {
        self.cache.invalidate_tag(CacheTag::Authors);
        self.cache.invalidate_tag(CacheTag::Books);
    }
}
