//! Cache key and tag definitions.

use std::fmt;

use crate::application::pagination::PageParams;
use crate::domain::types::ApiVersion;

/// Label grouping cache entries for bulk invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Books,
    Authors,
}

impl CacheTag {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheTag::Books => "booksCache",
            CacheTag::Authors => "authorsCache",
        }
    }

    pub(crate) const COUNT: usize = 2;

    pub(crate) fn index(self) -> usize {
        match self {
            CacheTag::Books => 0,
            CacheTag::Authors => 1,
        }
    }
}

/// Key for a cached list body, rendered as
/// `<operation>-<version>-<page>-<limit>`.
///
/// The version participates because shaped output differs per version; two
/// callers on different versions must never share bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListKey {
    operation: &'static str,
    version: ApiVersion,
    page: u32,
    limit: u32,
}

impl ListKey {
    pub fn books(version: ApiVersion, params: PageParams) -> Self {
        Self {
            operation: "getAllBooks",
            version,
            page: params.page,
            limit: params.limit,
        }
    }

    pub fn authors(version: ApiVersion, params: PageParams) -> Self {
        Self {
            operation: "getAllAuthors",
            version,
            page: params.page,
            limit: params.limit,
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.operation, self.version, self.page, self.limit
        )
    }
}
