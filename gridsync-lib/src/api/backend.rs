//! The backend seam.

use async_trait::async_trait;

use super::query::Page;
use super::query::QueryParams;
use crate::error::ApiError;
use crate::model::Row;
use crate::model::RowId;
use crate::model::RowPatch;

/// A remote collection the grid can page through and mutate.
///
/// [`GridClient`](crate::GridClient) implements this over HTTP. Implementations
/// must not panic; every failure is returned as an [`ApiError`].
///
/// # Example
///
/// ```ignore
/// use gridsync_lib::api::Backend;
///
/// let page = backend.fetch_page(&params).await?;
/// for row in page.rows() {
///     println!("{}", row.id());
/// }
/// ```
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetches one page. A response missing any metadata field is an
    /// [`ApiError::Malformed`].
    async fn fetch_page(&self, params: &QueryParams) -> Result<Page, ApiError>;

    /// Creates a row. The backend assigns the id.
    async fn create(&self, fields: &RowPatch) -> Result<Row, ApiError>;

    /// Replaces a row. Returns the backend's echo when it sent one.
    async fn update(&self, row: &Row) -> Result<Option<Row>, ApiError>;

    /// Deletes a row.
    async fn delete(&self, id: &RowId) -> Result<(), ApiError>;
}
