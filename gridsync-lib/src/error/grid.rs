//! Top-level error type

use super::ApiError;
use super::FieldValidationError;
use super::join_validation_errors;
use crate::grid::MutationKind;
use crate::model::RowId;

/// Main error type for grid operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A mutation for the same row is already in flight.
    #[error("{kind} already in progress for row {id}")]
    ConflictInProgress { id: RowId, kind: MutationKind },

    /// Client-side validation rejected the input; no request was sent.
    #[error("Validation failed: {}", join_validation_errors(.0))]
    Validation(Vec<FieldValidationError>),

    /// The requested action is not legal in the row's current state.
    #[error("Cannot {action} row {id} while it is {state}")]
    InvalidTransition {
        id: RowId,
        action: &'static str,
        state: &'static str,
    },

    /// The row is not part of the current page.
    #[error("Row {0} is not on the current page")]
    NotFound(RowId),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The grid was unmounted while the call was in flight.
    #[error("Grid is unmounted")]
    Unmounted,
}

impl Error {
    /// Returns the backend error, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if this is a [`Error::ConflictInProgress`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConflictInProgress { .. })
    }

    /// Returns the validation failures, if this is a validation error.
    pub fn validation_errors(&self) -> Option<&[FieldValidationError]> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// A short message suitable for showing to the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Validation(errors) => errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
