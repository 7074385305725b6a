//! Pagination state store

use crate::api::query::PaginationMetadata;

/// The grid's single source of truth for paging.
///
/// Only [`apply_server_metadata`](Self::apply_server_metadata) changes the
/// confirmed values, and only the controller calls it, after a non-stale
/// fetch succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationStore {
    current: PaginationMetadata,
    confirmed: bool,
}

impl PaginationStore {
    /// Creates a store holding defaults for the given page size.
    pub fn new(page_size: u32) -> Self {
        Self {
            current: PaginationMetadata::initial(page_size),
            confirmed: false,
        }
    }

    /// The last server-confirmed metadata, or the defaults.
    pub fn current(&self) -> PaginationMetadata {
        self.current
    }

    /// Returns `true` once a fetch has been applied.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Replaces the metadata with what the server reported.
    ///
    /// An inconsistent `total_pages` is logged and kept as reported.
    pub fn apply_server_metadata(&mut self, metadata: PaginationMetadata) {
        if !metadata.is_consistent() {
            log::warn!(
                "Server reported {} pages for {} items at {} per page",
                metadata.total_pages,
                metadata.total_items,
                metadata.page_size
            );
        }
        self.current = metadata;
        self.confirmed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_before_first_fetch() {
        let store = PaginationStore::new(10);
        assert!(!store.is_confirmed());
        assert_eq!(store.current().current_page, 1);
        assert_eq!(store.current().page_size, 10);
        assert_eq!(store.current().total_items, 0);
    }

    #[test]
    fn test_server_metadata_is_kept_verbatim() {
        let mut store = PaginationStore::new(10);
        let reported = PaginationMetadata {
            current_page: 2,
            page_size: 10,
            total_items: 25,
            // 3 expected; the server is authoritative anyway
            total_pages: 4,
            next_page: Some(3),
            prev_page: Some(1),
            first_page: 1,
            last_page: 4,
        };
        store.apply_server_metadata(reported);
        assert!(store.is_confirmed());
        assert_eq!(store.current(), reported);
    }
}
