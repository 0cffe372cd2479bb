use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCreateRequest {
    pub title: String,
    pub cover_text: String,
    pub comment: Option<String>,
    pub id_author: Option<i64>,
}

/// Update payloads carry the fixed mutable field set only; `comment` is
/// settable at create time and `id` never.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdateRequest {
    pub title: String,
    pub cover_text: String,
    pub id_author: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCreateRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorUpdateRequest {
    pub first_name: String,
    pub last_name: String,
}

/// Raw pagination query values. Kept as strings so resolution can fall back
/// to defaults on non-numeric input instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}
