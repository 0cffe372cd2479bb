use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::auth::AuthContext;
use crate::application::authors::{AuthorServiceError, CreateAuthorCommand, UpdateAuthorCommand};
use crate::application::books::{BookServiceError, CreateBookCommand, UpdateBookCommand};
use crate::application::error::ErrorReport;
use crate::application::pagination::PageParams;
use crate::application::repos::RepoError;
use crate::domain::types::{ApiVersion, Role};

use super::error::{ApiError, codes};
use super::models::{
    AuthorCreateRequest, AuthorUpdateRequest, BookCreateRequest, BookUpdateRequest, ListQuery,
};
use super::state::ApiState;

/// -------- Books --------

pub async fn list_books(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Extension(version): Extension<ApiVersion>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let params = PageParams::resolve(query.page.as_deref(), query.limit.as_deref());
    let body = state
        .books
        .list(params, version, &auth)
        .await
        .map_err(book_to_api)?;
    Ok(serialized_json(StatusCode::OK, body))
}

pub async fn get_book(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Extension(version): Extension<ApiVersion>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let shaped = state
        .books
        .get(id, version, &auth)
        .await
        .map_err(book_to_api)?;
    Ok(Json(shaped))
}

pub async fn create_book(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Extension(version): Extension<ApiVersion>,
    Json(payload): Json<BookCreateRequest>,
) -> Result<Response, ApiError> {
    ensure_admin(&auth, "admin role required to create books")?;

    let command = CreateBookCommand {
        title: payload.title,
        cover_text: payload.cover_text,
        comment: payload.comment,
        id_author: payload.id_author,
    };
    let (shaped, location) = state
        .books
        .create(command, version, &auth)
        .await
        .map_err(book_to_api)?;

    Ok(created_at(location, shaped))
}

pub async fn update_book(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<BookUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&auth, "admin role required to update books")?;

    let command = UpdateBookCommand {
        id,
        title: payload.title,
        cover_text: payload.cover_text,
        id_author: payload.id_author,
    };
    state.books.update(command).await.map_err(book_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_book(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&auth, "admin role required to delete books")?;

    state.books.delete(id).await.map_err(book_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

/// -------- Authors --------

pub async fn list_authors(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Extension(version): Extension<ApiVersion>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let params = PageParams::resolve(query.page.as_deref(), query.limit.as_deref());
    let body = state
        .authors
        .list(params, version, &auth)
        .await
        .map_err(author_to_api)?;
    Ok(serialized_json(StatusCode::OK, body))
}

pub async fn get_author(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Extension(version): Extension<ApiVersion>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let shaped = state
        .authors
        .get(id, version, &auth)
        .await
        .map_err(author_to_api)?;
    Ok(Json(shaped))
}

pub async fn create_author(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Extension(version): Extension<ApiVersion>,
    Json(payload): Json<AuthorCreateRequest>,
) -> Result<Response, ApiError> {
    ensure_admin(&auth, "admin role required to create authors")?;

    let command = CreateAuthorCommand {
        first_name: payload.first_name,
        last_name: payload.last_name,
    };
    let (shaped, location) = state
        .authors
        .create(command, version, &auth)
        .await
        .map_err(author_to_api)?;

    Ok(created_at(location, shaped))
}

pub async fn update_author(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<AuthorUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&auth, "admin role required to update authors")?;

    let command = UpdateAuthorCommand {
        id,
        first_name: payload.first_name,
        last_name: payload.last_name,
    };
    state.authors.update(command).await.map_err(author_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_author(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&auth, "admin role required to delete authors")?;

    state.authors.delete(id).await.map_err(author_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

/// -------- Health --------

pub async fn health(State(state): State<ApiState>) -> Response {
    let Some(db) = &state.db else {
        return StatusCode::NO_CONTENT.into_response();
    };
    match db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::api::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// -------- Helpers --------

fn ensure_admin(auth: &AuthContext, reason: &'static str) -> Result<(), ApiError> {
    if auth.is_granted(Role::Admin) {
        Ok(())
    } else {
        Err(ApiError::forbidden(reason))
    }
}

/// Wrap an already-serialized list body without re-encoding it; cached
/// bodies must reach the wire byte-identical.
fn serialized_json(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn created_at(location: String, shaped: serde_json::Value) -> Response {
    let mut response = (StatusCode::CREATED, Json(shaped)).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

fn book_to_api(err: BookServiceError) -> ApiError {
    match err {
        BookServiceError::Validation(violations) => ApiError::validation(violations),
        BookServiceError::NotFound => ApiError::not_found("Book not found"),
        BookServiceError::Repo(err) => repo_to_api(err),
        BookServiceError::Serialization(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Response shaping failed",
            Some(err.to_string()),
        ),
    }
}

fn author_to_api(err: AuthorServiceError) -> ApiError {
    match err {
        AuthorServiceError::Validation(violations) => ApiError::validation(violations),
        AuthorServiceError::NotFound => ApiError::not_found("Author not found"),
        AuthorServiceError::Repo(err) => repo_to_api(err),
        AuthorServiceError::Serialization(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Response shaping failed",
            Some(err.to_string()),
        ),
    }
}

fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}
