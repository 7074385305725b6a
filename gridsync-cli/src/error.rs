//! CLI error type

use gridsync_lib::error::ApiError;
use gridsync_lib::error::Error;
use gridsync_lib::model::RowId;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{}", .0.user_message())]
    Grid(#[from] Error),

    #[error("Row {0} not found")]
    NotFound(RowId),

    #[error("{failed} of {total} deletes failed")]
    PartialDelete { failed: usize, total: usize },

    #[error("Cannot set up logging: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Returns `true` if the backend could not be reached or did not answer.
    pub fn is_transport(&self) -> bool {
        match self {
            CliError::Api(e) => e.is_transport(),
            CliError::Grid(e) => e.api().is_some_and(ApiError::is_transport),
            _ => false,
        }
    }
}
