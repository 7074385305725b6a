//! Declarative description of a list request.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;

use super::Sort;

/// An inclusive creation-time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a date range.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// What page, filters and sort the grid wants.
///
/// Rebuilt for every request and never persisted. Absent `page` and
/// `page_size` are filled from the last server-confirmed pagination.
///
/// # Example
///
/// ```
/// use gridsync_lib::api::query::{QuerySpec, Sort};
///
/// let spec = QuerySpec::new()
///     .page(2)
///     .filter("role", "admin")
///     .sort(Sort::desc("age"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<Sort>,
    pub filters: BTreeMap<String, String>,
    pub date_range: Option<DateRange>,
}

impl QuerySpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the requested page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the requested page size.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Sets the sort order.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Adds a filter value for a field.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Sets the date range.
    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }
}
