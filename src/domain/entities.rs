//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub cover_text: String,
    pub comment: Option<String>,
    /// NULL when the author reference supplied at create time did not
    /// resolve to an existing author.
    pub author_id: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A book joined with its owning author, as listed and fetched for read
/// views. The author side is absent when `author_id` is NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct BookWithAuthor {
    pub book: BookRecord,
    pub author: Option<AuthorRecord>,
}
