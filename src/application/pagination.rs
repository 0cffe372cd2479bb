//! Offset pagination over store-ordered collections.
//!
//! Page numbering is 1-based. Both parameters are resolved leniently: an
//! absent, non-numeric, or non-positive value falls back to the default
//! rather than failing the request, so the list endpoints never reject a
//! pagination parameter.

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Resolve raw query values into effective parameters.
    pub fn resolve(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }

    /// Index of the first item on this page in the full ordered collection.
    fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value >= 1)
}

/// Return the items at positions `[(page-1)*limit, page*limit)` of the
/// ordered input. Empty when the page lies past the end of the collection.
pub fn window<T>(items: &[T], params: PageParams) -> &[T] {
    let start = params.offset();
    if start >= items.len() {
        return &[];
    }
    let end = start
        .saturating_add(params.limit as usize)
        .min(items.len());
    &items[start..end]
}
