//! Response shaping: serialization groups, since-version fields, hypermedia.
//!
//! Two orthogonal concerns meet here. A *group* names the subset of an
//! entity's fields that participates in an operation (`getBooks` for read
//! views, `createBook`/`createAuthor` for input validation). A *version*
//! further narrows the read view: a field introduced at version V is omitted
//! whenever the request resolved to a version below V.
//!
//! Shaped values are role-free so they can be cached and served to any
//! caller; admin-only links are attached after the cache step via
//! [`add_admin_links`] / [`attach_admin_links_to_collection`].

use serde_json::{Map, Value, json};
use url::Url;

use crate::application::auth::AuthContext;
use crate::domain::entities::{AuthorRecord, BookWithAuthor};
use crate::domain::types::{ApiVersion, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    /// Read views for both resources.
    GetBooks,
    /// Input group for book creation.
    CreateBook,
    /// Input group for author creation.
    CreateAuthor,
}

/// One row of the per-field visibility table: the field is emitted (or
/// validated) when the active group matches and the active version is at
/// least `since`.
struct FieldRule {
    field: &'static str,
    group: FieldGroup,
    since: ApiVersion,
}

const fn rule(field: &'static str, group: FieldGroup, since: ApiVersion) -> FieldRule {
    FieldRule {
        field,
        group,
        since,
    }
}

const BOOK_FIELDS: &[FieldRule] = &[
    rule("id", FieldGroup::GetBooks, ApiVersion::V1_0),
    rule("title", FieldGroup::GetBooks, ApiVersion::V1_0),
    rule("coverText", FieldGroup::GetBooks, ApiVersion::V1_0),
    rule("comment", FieldGroup::GetBooks, ApiVersion::V2_0),
    rule("author", FieldGroup::GetBooks, ApiVersion::V1_0),
    rule("title", FieldGroup::CreateBook, ApiVersion::V1_0),
    rule("coverText", FieldGroup::CreateBook, ApiVersion::V1_0),
    rule("comment", FieldGroup::CreateBook, ApiVersion::V2_0),
];

const AUTHOR_FIELDS: &[FieldRule] = &[
    rule("id", FieldGroup::GetBooks, ApiVersion::V1_0),
    rule("firstName", FieldGroup::GetBooks, ApiVersion::V1_0),
    rule("lastName", FieldGroup::GetBooks, ApiVersion::V1_0),
    rule("firstName", FieldGroup::CreateAuthor, ApiVersion::V1_0),
    rule("lastName", FieldGroup::CreateAuthor, ApiVersion::V1_0),
];

fn visible(table: &[FieldRule], field: &str, group: FieldGroup, version: ApiVersion) -> bool {
    table
        .iter()
        .any(|rule| rule.field == field && rule.group == group && version >= rule.since)
}

/// Shape a book (with its joined author) for the read group at `version`.
/// The result carries a `self` link only; see the module docs for how
/// admin links are attached.
pub fn shape_book(entry: &BookWithAuthor, version: ApiVersion, links: &LinkBuilder) -> Value {
    let group = FieldGroup::GetBooks;
    let mut out = Map::new();
    if visible(BOOK_FIELDS, "id", group, version) {
        out.insert("id".into(), json!(entry.book.id));
    }
    if visible(BOOK_FIELDS, "title", group, version) {
        out.insert("title".into(), json!(entry.book.title));
    }
    if visible(BOOK_FIELDS, "coverText", group, version) {
        out.insert("coverText".into(), json!(entry.book.cover_text));
    }
    if visible(BOOK_FIELDS, "comment", group, version) {
        out.insert("comment".into(), json!(entry.book.comment));
    }
    if visible(BOOK_FIELDS, "author", group, version) {
        let author = entry
            .author
            .as_ref()
            .map(|author| embedded_author(author, version));
        out.insert("author".into(), author.unwrap_or(Value::Null));
    }
    out.insert(
        "_links".into(),
        json!({ "self": links.url_for(Route::BookDetail, entry.book.id) }),
    );
    Value::Object(out)
}

/// Shape an author for the read group at `version`.
pub fn shape_author(author: &AuthorRecord, version: ApiVersion, links: &LinkBuilder) -> Value {
    let mut out = embedded_author(author, version);
    if let Value::Object(map) = &mut out {
        map.insert(
            "_links".into(),
            json!({ "self": links.url_for(Route::AuthorDetail, author.id) }),
        );
    }
    out
}

/// The author representation embedded inside book views: read fields only,
/// no links.
fn embedded_author(author: &AuthorRecord, version: ApiVersion) -> Value {
    let group = FieldGroup::GetBooks;
    let mut out = Map::new();
    if visible(AUTHOR_FIELDS, "id", group, version) {
        out.insert("id".into(), json!(author.id));
    }
    if visible(AUTHOR_FIELDS, "firstName", group, version) {
        out.insert("firstName".into(), json!(author.first_name));
    }
    if visible(AUTHOR_FIELDS, "lastName", group, version) {
        out.insert("lastName".into(), json!(author.last_name));
    }
    Value::Object(out)
}

/// Attach `update`/`delete` links to an already-shaped entity for a caller
/// granted the admin role. No-op for everyone else.
pub fn add_admin_links(value: &mut Value, route: Route, links: &LinkBuilder, auth: &AuthContext) {
    if !auth.is_granted(Role::Admin) {
        return;
    }
    let Some(map) = value.as_object_mut() else {
        return;
    };
    let Some(id) = map.get("id").and_then(Value::as_i64) else {
        return;
    };
    let url = links.url_for(route, id);
    if let Some(Value::Object(link_map)) = map.get_mut("_links") {
        link_map.insert("update".into(), json!(url));
        link_map.insert("delete".into(), json!(url));
    }
}

/// Post-cache decoration of a serialized list body. Cached bytes never
/// contain role-gated links; for admin callers the body is re-parsed and
/// each item gains its `update`/`delete` links.
pub fn attach_admin_links_to_collection(
    body: &str,
    route: Route,
    links: &LinkBuilder,
    auth: &AuthContext,
) -> Result<String, serde_json::Error> {
    if !auth.is_granted(Role::Admin) {
        return Ok(body.to_string());
    }
    let mut collection: Value = serde_json::from_str(body)?;
    if let Some(items) = collection.as_array_mut() {
        for item in items {
            add_admin_links(item, route, links, auth);
        }
    }
    serde_json::to_string(&collection)
}

/// Route names for the location generator, mirroring the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    BookDetail,
    AuthorDetail,
}

impl Route {
    fn path(self, id: i64) -> String {
        match self {
            Route::BookDetail => format!("books/{id}"),
            Route::AuthorDetail => format!("authors/{id}"),
        }
    }
}

/// Generates absolute URLs for entity routes from the configured API base.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base: Url,
}

impl LinkBuilder {
    /// The base keeps its host and path; a missing trailing slash is added
    /// so joins extend the path instead of replacing its last segment.
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base }
    }

    pub fn url_for(&self, route: Route, id: i64) -> String {
        match self.base.join(&route.path(id)) {
            Ok(url) => url.to_string(),
            // Joining a relative "books/<n>" path onto an absolute base
            // cannot fail; fall back to the bare path if it somehow does.
            Err(_) => format!("/{}", route.path(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::entities::BookRecord;

    fn builder() -> LinkBuilder {
        LinkBuilder::new(Url::parse("http://localhost:8080/api").expect("base url"))
    }

    fn sample_author(id: i64) -> AuthorRecord {
        AuthorRecord {
            id,
            first_name: "Frank".into(),
            last_name: "Herbert".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn sample_book(id: i64, author: Option<AuthorRecord>) -> BookWithAuthor {
        BookWithAuthor {
            book: BookRecord {
                id,
                title: "Dune".into(),
                cover_text: "A desert planet".into(),
                comment: Some("first of six".into()),
                author_id: author.as_ref().map(|a| a.id),
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
            },
            author,
        }
    }

    #[test]
    fn comment_is_hidden_below_version_two() {
        let shaped = shape_book(&sample_book(1, None), ApiVersion::V1_0, &builder());
        assert!(shaped.get("comment").is_none());
        assert_eq!(shaped["title"], json!("Dune"));
    }

    #[test]
    fn comment_appears_at_version_two() {
        let shaped = shape_book(&sample_book(1, None), ApiVersion::V2_0, &builder());
        assert_eq!(shaped["comment"], json!("first of six"));
    }

    #[test]
    fn missing_author_shapes_to_null() {
        let shaped = shape_book(&sample_book(1, None), ApiVersion::V1_0, &builder());
        assert_eq!(shaped["author"], Value::Null);
    }

    #[test]
    fn resolved_author_is_embedded() {
        let shaped = shape_book(&sample_book(1, Some(sample_author(7))), ApiVersion::V1_0, &builder());
        assert_eq!(shaped["author"]["id"], json!(7));
        assert_eq!(shaped["author"]["firstName"], json!("Frank"));
    }

    #[test]
    fn shaped_entities_carry_absolute_self_links() {
        let shaped = shape_book(&sample_book(5, None), ApiVersion::V1_0, &builder());
        assert_eq!(
            shaped["_links"]["self"],
            json!("http://localhost:8080/api/books/5")
        );

        let shaped = shape_author(&sample_author(7), ApiVersion::V1_0, &builder());
        assert_eq!(
            shaped["_links"]["self"],
            json!("http://localhost:8080/api/authors/7")
        );
    }

    #[test]
    fn admin_links_are_attached_only_for_admins() {
        let mut shaped = shape_book(&sample_book(5, None), ApiVersion::V1_0, &builder());
        add_admin_links(
            &mut shaped,
            Route::BookDetail,
            &builder(),
            &AuthContext::anonymous(),
        );
        assert!(shaped["_links"].get("update").is_none());

        add_admin_links(
            &mut shaped,
            Route::BookDetail,
            &builder(),
            &AuthContext::admin(),
        );
        assert_eq!(
            shaped["_links"]["update"],
            json!("http://localhost:8080/api/books/5")
        );
        assert_eq!(
            shaped["_links"]["delete"],
            json!("http://localhost:8080/api/books/5")
        );
    }

    #[test]
    fn collection_decoration_leaves_anonymous_bodies_untouched() {
        let body = serde_json::to_string(&vec![shape_book(
            &sample_book(1, None),
            ApiVersion::V1_0,
            &builder(),
        )])
        .expect("serialize");

        let unchanged = attach_admin_links_to_collection(
            &body,
            Route::BookDetail,
            &builder(),
            &AuthContext::anonymous(),
        )
        .expect("decorate");
        assert_eq!(unchanged, body);

        let decorated = attach_admin_links_to_collection(
            &body,
            Route::BookDetail,
            &builder(),
            &AuthContext::admin(),
        )
        .expect("decorate");
        let parsed: Value = serde_json::from_str(&decorated).expect("parse");
        assert!(parsed[0]["_links"]["delete"].is_string());
    }

    #[test]
    fn base_without_trailing_slash_keeps_its_last_segment() {
        let links = LinkBuilder::new(Url::parse("http://example.org/api/v1").expect("url"));
        assert_eq!(
            links.url_for(Route::AuthorDetail, 3),
            "http://example.org/api/v1/authors/3"
        );
    }
}
