//! Page type for paginated list results.

use crate::model::Row;

/// Server-reported paging facts for one page.
///
/// The backend is authoritative for every field; the grid never derives or
/// adjusts them locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationMetadata {
    /// The page these facts describe (1-based).
    pub current_page: u32,
    /// Rows per page, as requested.
    pub page_size: u32,
    /// Total rows across all pages.
    pub total_items: u64,
    /// Total pages.
    pub total_pages: u32,
    /// The next page, if any.
    pub next_page: Option<u32>,
    /// The previous page, if any.
    pub prev_page: Option<u32>,
    /// The first page cursor.
    pub first_page: u32,
    /// The last page cursor.
    pub last_page: u32,
}

impl PaginationMetadata {
    /// State before any fetch has succeeded.
    pub fn initial(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size,
            total_items: 0,
            total_pages: 0,
            next_page: None,
            prev_page: None,
            first_page: 1,
            last_page: 1,
        }
    }

    /// `ceil(total_items / page_size)`, or `None` for a zero page size.
    pub fn expected_pages(&self) -> Option<u64> {
        if self.page_size == 0 {
            return None;
        }
        Some(self.total_items.div_ceil(u64::from(self.page_size)))
    }

    /// Returns `true` if `total_pages` agrees with `total_items / page_size`.
    pub fn is_consistent(&self) -> bool {
        self.expected_pages() == Some(u64::from(self.total_pages))
    }

    /// Returns `true` if there is a next page.
    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }

    /// Returns `true` if there is a previous page.
    pub fn has_prev(&self) -> bool {
        self.prev_page.is_some()
    }
}

/// A page of rows with its pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    rows: Vec<Row>,
    metadata: PaginationMetadata,
}

impl Page {
    /// Creates a new page.
    pub fn new(rows: Vec<Row>, metadata: PaginationMetadata) -> Self {
        Self { rows, metadata }
    }

    /// Returns a reference to the rows in this page.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the pagination metadata.
    pub fn metadata(&self) -> &PaginationMetadata {
        &self.metadata
    }

    /// Consumes the page and returns its parts.
    pub fn into_parts(self) -> (Vec<Row>, PaginationMetadata) {
        (self.rows, self.metadata)
    }

    /// Returns `true` if this page has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows in this page.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are more pages after this one.
    pub fn has_more(&self) -> bool {
        self.metadata.has_next()
    }
}
