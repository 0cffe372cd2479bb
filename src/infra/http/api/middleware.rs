use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::auth::AuthContext;
use crate::domain::types::ApiVersion;

use super::error::ApiError;
use super::state::ApiState;

const VERSION_HEADER: &str = "x-api-version";

/// Resolve the caller's capability context and response version before any
/// handler runs.
///
/// Reads stay open to anonymous callers, so an unknown or absent token
/// degrades to an anonymous context rather than rejecting the request; the
/// role check itself happens in the mutation handlers.
pub async fn resolve_caller(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth = match extract_token(request.headers().get(axum::http::header::AUTHORIZATION)) {
        Some(token) if state.admin_tokens.contains(&token) => AuthContext::admin(),
        _ => AuthContext::anonymous(),
    };

    let version = match request.headers().get(VERSION_HEADER) {
        None => ApiVersion::default(),
        Some(value) => {
            let raw = match value.to_str() {
                Ok(raw) => raw,
                Err(_) => {
                    return ApiError::invalid_version("header is not valid UTF-8".to_string())
                        .into_response();
                }
            };
            match raw.parse::<ApiVersion>() {
                Ok(version) => version,
                Err(err) => return ApiError::invalid_version(err.to_string()).into_response(),
            }
        }
    };

    request.extensions_mut().insert(auth);
    request.extensions_mut().insert(version);

    next.run(request).await
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}
