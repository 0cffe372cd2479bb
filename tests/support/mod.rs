//! Shared test harness: in-memory repositories wired into the real router.

// Each integration test binary compiles its own copy of this module and
// uses a different subset of the helpers.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use url::Url;

use libris::application::authors::AuthorService;
use libris::application::books::BookService;
use libris::application::repos::{
    AuthorsRepo, AuthorsWriteRepo, BooksRepo, BooksWriteRepo, CreateAuthorParams,
    CreateBookParams, RepoError, UpdateAuthorParams, UpdateBookParams,
};
use libris::application::shaping::LinkBuilder;
use libris::cache::{CacheConfig, ResponseCache};
use libris::domain::entities::{AuthorRecord, BookRecord, BookWithAuthor};
use libris::infra::http::{ApiState, build_api_router};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const BASE_URL: &str = "http://api.test/";

#[derive(Default)]
struct StoreState {
    authors: Vec<AuthorRecord>,
    books: Vec<BookRecord>,
    next_author_id: i64,
    next_book_id: i64,
}

/// In-memory stand-in for the Postgres repositories, including the
/// author→books delete cascade the relational schema enforces.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(StoreState {
                next_author_id: 1,
                next_book_id: 1,
                ..StoreState::default()
            }),
        })
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }
}

#[async_trait]
impl AuthorsRepo for MemoryStore {
    async fn list_all(&self) -> Result<Vec<AuthorRecord>, RepoError> {
        Ok(self.state.lock().unwrap().authors.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AuthorRecord>, RepoError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .authors
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }
}

#[async_trait]
impl AuthorsWriteRepo for MemoryStore {
    async fn create_author(&self, params: CreateAuthorParams) -> Result<AuthorRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_author_id;
        state.next_author_id += 1;
        let record = AuthorRecord {
            id,
            first_name: params.first_name,
            last_name: params.last_name,
            created_at: Self::now(),
            updated_at: Self::now(),
        };
        state.authors.push(record.clone());
        Ok(record)
    }

    async fn update_author(&self, params: UpdateAuthorParams) -> Result<AuthorRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let author = state
            .authors
            .iter_mut()
            .find(|a| a.id == params.id)
            .ok_or(RepoError::NotFound)?;
        author.first_name = params.first_name;
        author.last_name = params.last_name;
        Ok(author.clone())
    }

    async fn delete_author(&self, id: i64) -> Result<bool, RepoError> {
        let mut state = self.state.lock().unwrap();
        let before = state.authors.len();
        state.authors.retain(|a| a.id != id);
        if state.authors.len() == before {
            return Ok(false);
        }
        // The FK cascade.
        state.books.retain(|b| b.author_id != Some(id));
        Ok(true)
    }
}

#[async_trait]
impl BooksRepo for MemoryStore {
    async fn list_all(&self) -> Result<Vec<BookWithAuthor>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .books
            .iter()
            .map(|book| BookWithAuthor {
                book: book.clone(),
                author: book
                    .author_id
                    .and_then(|id| state.authors.iter().find(|a| a.id == id).cloned()),
            })
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<BookWithAuthor>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.books.iter().find(|b| b.id == id).map(|book| {
            BookWithAuthor {
                book: book.clone(),
                author: book
                    .author_id
                    .and_then(|id| state.authors.iter().find(|a| a.id == id).cloned()),
            }
        }))
    }
}

#[async_trait]
impl BooksWriteRepo for MemoryStore {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_book_id;
        state.next_book_id += 1;
        let record = BookRecord {
            id,
            title: params.title,
            cover_text: params.cover_text,
            comment: params.comment,
            author_id: params.author_id,
            created_at: Self::now(),
            updated_at: Self::now(),
        };
        state.books.push(record.clone());
        Ok(record)
    }

    async fn update_book(&self, params: UpdateBookParams) -> Result<BookRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let book = state
            .books
            .iter_mut()
            .find(|b| b.id == params.id)
            .ok_or(RepoError::NotFound)?;
        book.title = params.title;
        book.cover_text = params.cover_text;
        book.author_id = params.author_id;
        Ok(book.clone())
    }

    async fn delete_book(&self, id: i64) -> Result<bool, RepoError> {
        let mut state = self.state.lock().unwrap();
        let before = state.books.len();
        state.books.retain(|b| b.id != id);
        Ok(state.books.len() != before)
    }
}

pub fn build_router(store: Arc<MemoryStore>, cache_config: CacheConfig) -> Router {
    let cache = Arc::new(ResponseCache::new(cache_config));
    let links = Arc::new(LinkBuilder::new(Url::parse(BASE_URL).expect("base url")));

    let books = Arc::new(BookService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        cache.clone(),
        links.clone(),
    ));
    let authors = Arc::new(AuthorService::new(store.clone(), store, cache, links));

    build_api_router(ApiState {
        books,
        authors,
        admin_tokens: Arc::new(vec![ADMIN_TOKEN.to_string()]),
        db: None,
    })
}

pub fn default_router() -> Router {
    build_router(MemoryStore::new(), CacheConfig::default())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body should be JSON")
    }
}

async fn into_test_response(response: Response<Body>) -> TestResponse {
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    TestResponse {
        status,
        location,
        body: String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router never errors");
    into_test_response(response).await
}

pub async fn get(router: &Router, path: &str) -> TestResponse {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request");
    send(router, request).await
}

pub async fn get_versioned(router: &Router, path: &str, version: &str) -> TestResponse {
    let request = Request::builder()
        .uri(path)
        .header("x-api-version", version)
        .body(Body::empty())
        .expect("request");
    send(router, request).await
}

pub async fn get_as_admin(router: &Router, path: &str) -> TestResponse {
    let request = Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .expect("request");
    send(router, request).await
}

pub async fn post_json(
    router: &Router,
    path: &str,
    payload: Value,
    token: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(payload.to_string()))
        .expect("request");
    send(router, request).await
}

pub async fn put_json(
    router: &Router,
    path: &str,
    payload: Value,
    token: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(payload.to_string()))
        .expect("request");
    send(router, request).await
}

pub async fn delete(router: &Router, path: &str, token: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method("DELETE").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).expect("request");
    send(router, request).await
}

/// Seed an author through the API; returns its id.
pub async fn seed_author(router: &Router, first: &str, last: &str) -> i64 {
    let response = post_json(
        router,
        "/authors",
        serde_json::json!({ "firstName": first, "lastName": last }),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()["id"].as_i64().expect("author id")
}

/// Seed a book through the API; returns its id.
pub async fn seed_book(router: &Router, title: &str, id_author: Option<i64>) -> i64 {
    let response = post_json(
        router,
        "/books",
        serde_json::json!({
            "title": title,
            "coverText": format!("{title} cover"),
            "idAuthor": id_author,
        }),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()["id"].as_i64().expect("book id")
}
