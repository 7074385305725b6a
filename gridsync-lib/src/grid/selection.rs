//! Selection manager

use std::collections::BTreeSet;

use crate::model::RowId;

/// Row ids selected for bulk operations.
///
/// Independent of the current page: navigating or re-fetching keeps the
/// selection, and only a confirmed delete removes ids from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RowId>,
}

impl SelectionSet {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the id if unselected, otherwise unselects it. Returns the new
    /// selected state.
    pub fn toggle(&mut self, id: &RowId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Unselects everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Adds every given id, keeping selections from other pages.
    pub fn set_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a RowId>) {
        self.ids.extend(ids.into_iter().cloned());
    }

    /// Removes the given ids.
    pub fn remove<'a>(&mut self, ids: impl IntoIterator<Item = &'a RowId>) {
        for id in ids {
            self.ids.remove(id);
        }
    }

    /// The selected ids, in order.
    pub fn current(&self) -> Vec<RowId> {
        self.ids.iter().cloned().collect()
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
