//! View-model published to the presentation layer

use std::collections::BTreeMap;

use crate::api::query::DateRange;
use crate::api::query::PaginationMetadata;
use crate::api::query::Sort;
use crate::api::query::TotalScope;
use crate::model::Row;
use crate::model::RowId;

/// What a row is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Idle,
    Editing,
    Saving,
    /// Delete in flight. The row stays visible until the server confirms.
    Deleting,
}

/// A row as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub row: Row,
    pub selected: bool,
    pub status: RowStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A user-visible message about the last operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Snapshot of everything the grid renders.
///
/// Re-derived and published on every state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub rows: Vec<RowView>,
    /// The last server-confirmed pagination, or defaults before any fetch.
    pub pagination: PaginationMetadata,
    /// `false` until the first fetch has been applied.
    pub confirmed: bool,
    /// Rows the operator should consider matching. See [`TotalScope`].
    pub apparent_total: u64,
    pub total_scope: TotalScope,
    pub is_loading: bool,
    pub notice: Option<Notice>,
    pub selection: Vec<RowId>,
    pub filters: BTreeMap<String, String>,
    pub sort: Option<Sort>,
    pub date_range: Option<DateRange>,
}

impl GridView {
    /// Looks up a row on the current page.
    pub fn row(&self, id: &RowId) -> Option<&RowView> {
        self.rows.iter().find(|r| r.row.id() == id)
    }

    /// Ids of the rows on the current page, in display order.
    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|r| r.row.id().clone()).collect()
    }

    /// The error notice, if the last operation failed.
    pub fn error(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.is_error())
            .map(|n| n.message.as_str())
    }
}
