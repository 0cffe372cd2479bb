use std::sync::Arc;

use crate::application::authors::AuthorService;
use crate::application::books::BookService;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct ApiState {
    pub books: Arc<BookService>,
    pub authors: Arc<AuthorService>,
    /// Bearer tokens granted the admin role, from `[auth] admin_tokens`.
    pub admin_tokens: Arc<Vec<String>>,
    /// Absent when the router is wired over in-memory repositories (tests);
    /// the health endpoint then reports process liveness only.
    pub db: Option<Arc<PostgresRepositories>>,
}
