//! Mutation state machines
//!
//! Each row has at most one edit state and one delete state. A row that has
//! neither is `Idle`; the controller keeps only non-idle entries.

use std::fmt;

use crate::error::Error;
use crate::model::Row;
use crate::model::RowId;
use crate::model::RowPatch;

/// What a mutation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Edit,
    Delete,
    BulkDelete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::Edit => "edit",
            MutationKind::Delete => "delete",
            MutationKind::BulkDelete => "bulk delete",
        })
    }
}

/// One in-flight backend call. Dropped when the call completes.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationIntent {
    pub row_id: RowId,
    pub kind: MutationKind,
    pub payload: Option<RowPatch>,
}

impl MutationIntent {
    pub fn edit(row_id: RowId, patch: RowPatch) -> Self {
        Self {
            row_id,
            kind: MutationKind::Edit,
            payload: Some(patch),
        }
    }

    pub fn delete(row_id: RowId, kind: MutationKind) -> Self {
        Self {
            row_id,
            kind,
            payload: None,
        }
    }
}

// =============================================================================
// Edit
// =============================================================================

/// Inline edit lifecycle of one row.
///
/// ```text
/// Idle --start--> Editing --save--> Saving --ok--> Idle
///   |                ^                 |
///   +-----save-------|-----------------+
///                    +------failed-----+
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    /// The edit form is open. `original` is the row as it was when opened.
    Editing { original: Row },
    /// A save is in flight. The form reopens with `prior` if it fails.
    Saving { prior: Row, intent: MutationIntent },
}

impl EditState {
    /// Name of the state, for messages.
    pub fn name(&self) -> &'static str {
        match self {
            EditState::Idle => "idle",
            EditState::Editing { .. } => "editing",
            EditState::Saving { .. } => "saving",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, EditState::Idle)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, EditState::Saving { .. })
    }

    /// Opens the edit form. Reopening an open form keeps its original values.
    pub fn start(&mut self, row: &Row) -> Result<(), Error> {
        match self {
            EditState::Idle => {
                *self = EditState::Editing {
                    original: row.clone(),
                };
                Ok(())
            }
            EditState::Editing { .. } => Ok(()),
            EditState::Saving { .. } => Err(Error::ConflictInProgress {
                id: row.id().clone(),
                kind: MutationKind::Edit,
            }),
        }
    }

    /// Closes the edit form without saving.
    pub fn cancel(&mut self, id: &RowId) -> Result<(), Error> {
        match self {
            EditState::Idle | EditState::Editing { .. } => {
                *self = EditState::Idle;
                Ok(())
            }
            EditState::Saving { .. } => Err(Error::InvalidTransition {
                id: id.clone(),
                action: "cancel edit of",
                state: self.name(),
            }),
        }
    }

    /// Moves to `Saving`. A second save for the same row while one is in
    /// flight is a conflict.
    pub fn begin_save(&mut self, current: &Row, patch: RowPatch) -> Result<MutationIntent, Error> {
        if self.is_saving() {
            return Err(Error::ConflictInProgress {
                id: current.id().clone(),
                kind: MutationKind::Edit,
            });
        }
        let intent = MutationIntent::edit(current.id().clone(), patch);
        *self = EditState::Saving {
            prior: current.clone(),
            intent: intent.clone(),
        };
        Ok(intent)
    }

    /// Ends a save. On failure the form reopens with the prior values.
    pub fn finish_save(&mut self, succeeded: bool) {
        match std::mem::take(self) {
            EditState::Saving { prior, .. } if !succeeded => {
                *self = EditState::Editing { original: prior };
            }
            EditState::Saving { .. } => {}
            other => *self = other,
        }
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Delete lifecycle of one row.
///
/// ```text
/// Idle --delete--> Deleting --ok--> Removed
///                     |
///                     +---failed--> Idle
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DeleteState {
    #[default]
    Idle,
    Deleting(MutationIntent),
    Removed,
}

impl DeleteState {
    pub fn name(&self) -> &'static str {
        match self {
            DeleteState::Idle => "idle",
            DeleteState::Deleting(_) => "deleting",
            DeleteState::Removed => "removed",
        }
    }

    pub fn is_deleting(&self) -> bool {
        matches!(self, DeleteState::Deleting(_))
    }

    /// Moves to `Deleting`.
    pub fn begin(&mut self, id: &RowId, kind: MutationKind) -> Result<MutationIntent, Error> {
        match self {
            DeleteState::Idle => {
                let intent = MutationIntent::delete(id.clone(), kind);
                *self = DeleteState::Deleting(intent.clone());
                Ok(intent)
            }
            DeleteState::Deleting(intent) => Err(Error::ConflictInProgress {
                id: id.clone(),
                kind: intent.kind,
            }),
            DeleteState::Removed => Err(Error::InvalidTransition {
                id: id.clone(),
                action: "delete",
                state: self.name(),
            }),
        }
    }

    /// Ends a delete: `Removed` on success, back to `Idle` on failure.
    pub fn finish(&mut self, succeeded: bool) {
        if self.is_deleting() {
            *self = if succeeded {
                DeleteState::Removed
            } else {
                DeleteState::Idle
            };
        }
    }
}
