//! Pagination for the metadata table view (100 rows/page)

use serde::Serialize;

/// Page size constant for all pagination
pub const PAGE_SIZE: usize = 100;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Index of the first row on this page
    #[serde(skip)]
    pub offset: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]
///
/// # Examples
/// ```
/// use snowguard_dash::pagination::calculate_pagination;
///
/// // 250 total results = 3 pages (100 + 100 + 50)
/// let p = calculate_pagination(250, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 100);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(250, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 200);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize) -> Pagination {
    let total_pages = total_results.div_ceil(PAGE_SIZE);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}

impl Pagination {
    /// The rows of `items` that fall on this page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset.min(items.len());
        let end = (start + PAGE_SIZE).min(items.len());
        &items[start..end]
    }
}
