//! Grid controller
//!
//! Owns the pagination store, the selection, the row cache and the mutation
//! registries for the lifetime of one mounted grid. All methods take `&self`
//! and may run concurrently; state is only touched between network calls.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::DeleteState;
use super::EditState;
use super::GridConfig;
use super::GridView;
use super::MutationKind;
use super::Notice;
use super::PaginationStore;
use super::RowStatus;
use super::RowView;
use super::SelectionSet;
use crate::api::Backend;
use crate::api::query;
use crate::api::query::DateRange;
use crate::api::query::Page;
use crate::api::query::PaginationMetadata;
use crate::api::query::QueryParams;
use crate::api::query::QuerySpec;
use crate::api::query::Sort;
use crate::api::query::TotalScope;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::CREATED_AT_KEY;
use crate::model::CREATED_BY_KEY;
use crate::model::Row;
use crate::model::RowId;
use crate::model::RowPatch;
use crate::model::UPDATED_AT_KEY;
use crate::model::UPDATED_BY_KEY;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a fetch that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied.
    Applied { seq: u64 },
    /// A newer fetch was issued while this one was in flight; the response
    /// was discarded.
    Stale { seq: u64 },
    /// The grid was unmounted; nothing was applied.
    Unmounted,
}

/// Result of a save that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The row as it now stands in the cache.
    Saved(Row),
    Unmounted,
}

/// Result of a single delete that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// The id was not on the current page. Nothing changed.
    NotPresent,
    Unmounted,
}

/// Result of a create that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Row),
    Unmounted,
}

/// Per-id outcome of a bulk delete.
#[derive(Debug, Default)]
pub struct BulkDeleteReport {
    pub succeeded: Vec<RowId>,
    pub failed: Vec<(RowId, Error)>,
}

impl BulkDeleteReport {
    /// Returns `true` if every attempted delete succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Ids that failed, for retrying exactly that subset.
    pub fn failed_ids(&self) -> Vec<RowId> {
        self.failed.iter().map(|(id, _)| id.clone()).collect()
    }
}

// =============================================================================
// State
// =============================================================================

struct GridState {
    pagination: PaginationStore,
    selection: SelectionSet,
    rows: Vec<Row>,
    apparent_total: u64,
    total_scope: TotalScope,
    filters: BTreeMap<String, String>,
    sort: Option<Sort>,
    date_range: Option<DateRange>,
    edits: HashMap<RowId, EditState>,
    deletes: HashMap<RowId, DeleteState>,
    latest_seq: u64,
    is_loading: bool,
    notice: Option<Notice>,
}

impl GridState {
    fn new(page_size: u32) -> Self {
        Self {
            pagination: PaginationStore::new(page_size),
            selection: SelectionSet::new(),
            rows: Vec::new(),
            apparent_total: 0,
            total_scope: TotalScope::Server,
            filters: BTreeMap::new(),
            sort: None,
            date_range: None,
            edits: HashMap::new(),
            deletes: HashMap::new(),
            latest_seq: 0,
            is_loading: false,
            notice: None,
        }
    }

    fn query_spec(&self, page: Option<u32>, page_size: Option<u32>) -> QuerySpec {
        QuerySpec {
            page,
            page_size,
            sort: self.sort.clone(),
            filters: self.filters.clone(),
            date_range: self.date_range,
        }
    }

    fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id() == id)
    }

    fn replace_row(&mut self, row: Row) {
        if let Some(slot) = self.rows.iter_mut().find(|r| r.id() == row.id()) {
            *slot = row;
        }
    }

    fn apply_page(&mut self, page: Page, params: &QueryParams) {
        let (rows, metadata) = page.into_parts();
        let refined = query::refine(rows, params.refinements(), metadata.total_items);

        self.pagination.apply_server_metadata(metadata);
        self.rows = refined.rows;
        self.apparent_total = refined.apparent_total;
        self.total_scope = refined.scope;

        // Open forms for rows that left the page close; saves keep running.
        let rows = &self.rows;
        self.edits
            .retain(|id, edit| edit.is_saving() || rows.iter().any(|r| r.id() == id));

        if self.notice.as_ref().is_some_and(Notice::is_error) {
            self.notice = None;
        }
    }

    /// Returns `true` if an edit touches the active sort or an active filter,
    /// so the local patch may no longer place the row correctly.
    fn patch_needs_refetch(&self, patch: &RowPatch) -> bool {
        let touches_sort = self
            .sort
            .as_ref()
            .is_some_and(|sort| patch.touches(sort.field()));
        let touches_filter = self
            .filters
            .iter()
            .filter(|(_, value)| value.as_str() != query::ALL && !value.trim().is_empty())
            .any(|(field, _)| patch.touches(field));
        touches_sort || touches_filter
    }

    fn status(&self, id: &RowId) -> RowStatus {
        if self.deletes.get(id).is_some_and(DeleteState::is_deleting) {
            return RowStatus::Deleting;
        }
        match self.edits.get(id) {
            Some(EditState::Saving { .. }) => RowStatus::Saving,
            Some(EditState::Editing { .. }) => RowStatus::Editing,
            _ => RowStatus::Idle,
        }
    }

    fn view(&self) -> GridView {
        GridView {
            rows: self
                .rows
                .iter()
                .map(|row| RowView {
                    row: row.clone(),
                    selected: self.selection.contains(row.id()),
                    status: self.status(row.id()),
                })
                .collect(),
            pagination: self.pagination.current(),
            confirmed: self.pagination.is_confirmed(),
            apparent_total: self.apparent_total,
            total_scope: self.total_scope,
            is_loading: self.is_loading,
            notice: self.notice.clone(),
            selection: self.selection.current(),
            filters: self.filters.clone(),
            sort: self.sort.clone(),
            date_range: self.date_range,
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Drives one grid against a [`Backend`].
///
/// Cheap to clone; clones share the same state.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use gridsync_lib::{GridClient, GridConfig, GridController};
///
/// let client = GridClient::builder()
///     .url("http://localhost:3000")
///     .resource("users")
///     .build()?;
/// let grid = GridController::new(Arc::new(client), GridConfig::default());
///
/// grid.refetch().await?;
/// grid.set_page(2).await?;
/// println!("{:?}", grid.view().pagination);
/// ```
#[derive(Clone)]
pub struct GridController {
    inner: Arc<GridInner>,
}

struct GridInner {
    backend: Arc<dyn Backend>,
    config: GridConfig,
    state: Mutex<GridState>,
    view_tx: watch::Sender<GridView>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for GridController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridController")
            .field("config", &self.inner.config)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

impl GridController {
    /// Creates a controller. Nothing is fetched until [`refetch`](Self::refetch)
    /// or a navigation method is called.
    pub fn new(backend: Arc<dyn Backend>, config: GridConfig) -> Self {
        let state = GridState::new(config.page_size);
        let (view_tx, _) = watch::channel(state.view());
        Self {
            inner: Arc::new(GridInner {
                backend,
                config,
                state: Mutex::new(state),
                view_tx,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.inner.config
    }

    /// Receives a fresh [`GridView`] on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<GridView> {
        self.inner.view_tx.subscribe()
    }

    /// The last published view.
    pub fn view(&self) -> GridView {
        self.inner.view_tx.borrow().clone()
    }

    pub async fn pagination(&self) -> PaginationMetadata {
        self.inner.state.lock().await.pagination.current()
    }

    pub async fn selection(&self) -> Vec<RowId> {
        self.inner.state.lock().await.selection.current()
    }

    /// The cached rows of the current page, after refinement.
    pub async fn rows(&self) -> Vec<Row> {
        self.inner.state.lock().await.rows.clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    /// Stops applying results. Calls still in flight complete as no-ops.
    pub fn unmount(&self) {
        log::debug!("Unmounting grid");
        self.inner.cancel.cancel();
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Re-fetches the current page with the current filters and sort.
    pub async fn refetch(&self) -> Result<FetchOutcome, Error> {
        self.fetch(None, None).await
    }

    /// Navigates to a page. The store changes only once the server answers.
    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome, Error> {
        self.fetch(Some(page.max(1)), None).await
    }

    /// Changes the page size and returns to the first page.
    pub async fn set_page_size(&self, page_size: u32) -> Result<FetchOutcome, Error> {
        self.fetch(Some(1), Some(page_size.max(1))).await
    }

    /// Sets a filter value and returns to the first page. A blank value
    /// removes the filter.
    pub async fn set_filter(
        &self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<FetchOutcome, Error> {
        let (field, value) = (field.into(), value.into());
        self.update_query(1, None, |state| {
            if value.trim().is_empty() {
                state.filters.remove(&field);
            } else {
                state.filters.insert(field, value);
            }
        })
        .await
    }

    pub async fn clear_filters(&self) -> Result<FetchOutcome, Error> {
        self.update_query(1, None, |state| state.filters.clear()).await
    }

    pub async fn set_sort(&self, sort: Option<Sort>) -> Result<FetchOutcome, Error> {
        self.update_query(1, None, |state| state.sort = sort).await
    }

    pub async fn set_date_range(&self, range: Option<DateRange>) -> Result<FetchOutcome, Error> {
        self.update_query(1, None, |state| state.date_range = range).await
    }

    /// Replaces filters, sort and date range in one go and fetches the
    /// requested page with a single request.
    pub async fn set_query(&self, spec: QuerySpec) -> Result<FetchOutcome, Error> {
        let QuerySpec {
            page,
            page_size,
            sort,
            filters,
            date_range,
        } = spec;
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.map(|size| size.max(1));
        self.update_query(page, page_size, |state| {
            state.filters = filters
                .into_iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .collect();
            state.sort = sort;
            state.date_range = date_range;
        })
        .await
    }

    /// Applies a query change and fetches. If the fetch fails the previous
    /// filters, sort and date range come back, so the view never shows a
    /// query its rows were not fetched with.
    async fn update_query(
        &self,
        page: u32,
        page_size: Option<u32>,
        change: impl FnOnce(&mut GridState),
    ) -> Result<FetchOutcome, Error> {
        let previous = {
            let mut state = self.inner.state.lock().await;
            if !self.is_mounted() {
                return Ok(FetchOutcome::Unmounted);
            }
            let previous = (state.filters.clone(), state.sort.clone(), state.date_range);
            change(&mut state);
            previous
        };

        let result = self.fetch(Some(page), page_size).await;
        if result.is_err() {
            let mut state = self.inner.state.lock().await;
            (state.filters, state.sort, state.date_range) = previous;
            self.publish(&state);
        }
        result
    }

    async fn fetch(&self, page: Option<u32>, page_size: Option<u32>) -> Result<FetchOutcome, Error> {
        let (seq, params) = {
            let mut state = self.inner.state.lock().await;
            if !self.is_mounted() {
                return Ok(FetchOutcome::Unmounted);
            }
            state.latest_seq += 1;
            state.is_loading = true;
            let spec = state.query_spec(page, page_size);
            let params = query::build(
                &spec,
                &state.pagination.current(),
                &self.inner.config.filter_policy,
            );
            self.publish(&state);
            (state.latest_seq, params)
        };

        log::debug!("Fetch #{}: {}", seq, params.to_query_string());
        let result = self.bounded(self.inner.backend.fetch_page(&params)).await;

        let mut state = self.inner.state.lock().await;
        if !self.is_mounted() {
            return Ok(FetchOutcome::Unmounted);
        }
        if seq != state.latest_seq {
            log::warn!(
                "Discarding stale response for fetch #{} (latest is #{})",
                seq,
                state.latest_seq
            );
            return Ok(FetchOutcome::Stale { seq });
        }

        state.is_loading = false;
        match result {
            Ok(page) => {
                state.apply_page(page, &params);
                self.publish(&state);
                Ok(FetchOutcome::Applied { seq })
            }
            Err(Error::Unmounted) => Ok(FetchOutcome::Unmounted),
            Err(e) => Err(self.fail(&mut state, "Failed to load rows", e)),
        }
    }

    /// Re-fetches after a mutation. If rows were removed from the end of the
    /// collection and the current page no longer exists, moves to the last one.
    async fn reconcile(&self) {
        let outcome = match self.refetch().await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Re-fetch after mutation failed: {}", e);
                return;
            }
        };
        if !matches!(outcome, FetchOutcome::Applied { .. }) {
            return;
        }

        let current = self.pagination().await;
        if current.total_pages > 0 && current.current_page > current.total_pages {
            if let Err(e) = self.set_page(current.total_pages).await {
                log::warn!("Moving to last page failed: {}", e);
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Toggles one row. Returns whether it is now selected.
    pub async fn toggle_select(&self, id: &RowId) -> bool {
        let mut state = self.inner.state.lock().await;
        let selected = state.selection.toggle(id);
        self.publish(&state);
        selected
    }

    /// Selects every row of the current page, keeping other selections.
    pub async fn select_page(&self) {
        let mut state = self.inner.state.lock().await;
        let ids: Vec<RowId> = state.rows.iter().map(|r| r.id().clone()).collect();
        state.selection.set_all(&ids);
        self.publish(&state);
    }

    pub async fn clear_selection(&self) {
        let mut state = self.inner.state.lock().await;
        state.selection.clear();
        self.publish(&state);
    }

    pub async fn dismiss_notice(&self) {
        let mut state = self.inner.state.lock().await;
        state.notice = None;
        self.publish(&state);
    }

    // =========================================================================
    // Edit
    // =========================================================================

    /// Opens the edit form for a row on the current page.
    pub async fn start_edit(&self, id: &RowId) -> Result<(), Error> {
        let mut state = self.inner.state.lock().await;
        let Some(row) = state.row(id).cloned() else {
            return Err(self.fail(&mut state, "Cannot edit", Error::NotFound(id.clone())));
        };
        if let Err(e) = state.edits.entry(id.clone()).or_default().start(&row) {
            return Err(self.fail(&mut state, "Cannot edit", e));
        }
        self.publish(&state);
        Ok(())
    }

    /// Closes the edit form without saving.
    pub async fn cancel_edit(&self, id: &RowId) -> Result<(), Error> {
        let mut state = self.inner.state.lock().await;
        let Some(edit) = state.edits.get_mut(id) else {
            return Ok(());
        };
        edit.cancel(id)?;
        state.edits.remove(id);
        self.publish(&state);
        Ok(())
    }

    /// Validates and saves an edit.
    ///
    /// The merged row is sent with `PUT`. On success the cache takes the
    /// server's echo, or the local merge with a bumped `updatedAt` if the
    /// server sent none. On failure the cached row is left untouched and the
    /// form reopens with the values it held when the save began.
    pub async fn save_edit(&self, id: &RowId, patch: RowPatch) -> Result<EditOutcome, Error> {
        let (prior, outgoing) = {
            let mut state = self.inner.state.lock().await;
            if !self.is_mounted() {
                return Ok(EditOutcome::Unmounted);
            }

            let errors = self.inner.config.schema.validate_patch(&patch);
            if !errors.is_empty() {
                return Err(self.fail(&mut state, "Cannot save", Error::Validation(errors)));
            }

            let Some(prior) = state.row(id).cloned() else {
                return Err(self.fail(&mut state, "Cannot save", Error::NotFound(id.clone())));
            };
            let begun = state
                .edits
                .entry(id.clone())
                .or_default()
                .begin_save(&prior, patch.clone());
            if let Err(e) = begun {
                return Err(self.fail(&mut state, "Cannot save", e));
            }

            let mut outgoing = prior.clone();
            outgoing.apply_patch(&patch, Utc::now());
            if let Some(actor) = &self.inner.config.actor {
                outgoing = outgoing.with_updated_by(actor.clone());
            }

            self.publish(&state);
            (prior, outgoing)
        };

        log::debug!("Saving row {}", id);
        let result = self.bounded(self.inner.backend.update(&outgoing)).await;

        let mut state = self.inner.state.lock().await;
        if !self.is_mounted() {
            return Ok(EditOutcome::Unmounted);
        }

        let saved = match result {
            Ok(echo) => {
                let mut saved = echo.unwrap_or(outgoing);
                if let Some(at) = prior.updated_at() {
                    saved.touch(at);
                }
                saved
            }
            Err(Error::Unmounted) => return Ok(EditOutcome::Unmounted),
            Err(e) => {
                // The cache was never patched, and a refetch may have brought
                // a newer row meanwhile. Only the form reopens.
                if let Some(edit) = state.edits.get_mut(id) {
                    edit.finish_save(false);
                }
                return Err(self.fail(&mut state, "Failed to save", e));
            }
        };

        if let Some(edit) = state.edits.get_mut(id) {
            edit.finish_save(true);
        }
        state.edits.remove(id);
        state.replace_row(saved.clone());
        let refetch = state.patch_needs_refetch(&patch);
        self.publish(&state);
        drop(state);

        if refetch {
            self.reconcile().await;
        }
        self.notify(Notice::success(format!("Saved row {}", id))).await;
        Ok(EditOutcome::Saved(saved))
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes one row from the current page.
    ///
    /// An id that is not on the current page is a no-op.
    pub async fn delete_one(&self, id: &RowId) -> Result<DeleteOutcome, Error> {
        let outcome = match self.delete_row(id, MutationKind::Delete).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let mut state = self.inner.state.lock().await;
                return Err(self.fail(&mut state, "Failed to delete", e));
            }
        };

        if outcome == DeleteOutcome::Removed {
            self.reconcile().await;
            self.notify(Notice::success(format!("Deleted row {}", id))).await;
        }
        Ok(outcome)
    }

    /// Deletes every selected id concurrently, committing each outcome as it
    /// arrives.
    ///
    /// Ids that succeed leave the cache and the selection. Ids that fail stay
    /// selected and are listed in the report.
    pub async fn delete_selected(&self) -> Result<BulkDeleteReport, Error> {
        let ids = self.selection().await;
        let mut report = BulkDeleteReport::default();
        if ids.is_empty() {
            self.notify(Notice::info("Nothing selected")).await;
            return Ok(report);
        }

        log::debug!("Deleting {} selected rows", ids.len());
        let results = join_all(ids.iter().map(|id| self.delete_row(id, MutationKind::BulkDelete))).await;

        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(DeleteOutcome::Removed | DeleteOutcome::NotPresent) => report.succeeded.push(id),
                Ok(DeleteOutcome::Unmounted) => {}
                Err(e) => report.failed.push((id, e)),
            }
        }

        if !self.is_mounted() {
            return Ok(report);
        }
        if !report.succeeded.is_empty() {
            self.reconcile().await;
        }

        let notice = if report.is_success() {
            Notice::success(format!("Deleted {} rows", report.succeeded.len()))
        } else {
            let details = report
                .failed
                .iter()
                .map(|(id, e)| format!("{}: {}", id, e.user_message()))
                .collect::<Vec<_>>()
                .join("; ");
            log::warn!("Bulk delete: {} failed ({})", report.failed.len(), details);
            Notice::error(format!(
                "Failed to delete {} of {} rows: {}",
                report.failed.len(),
                report.failed.len() + report.succeeded.len(),
                details
            ))
        };
        self.notify(notice).await;
        Ok(report)
    }

    /// Runs one delete and commits its outcome. Single deletes require the row
    /// to be cached; bulk deletes may target ids selected on other pages.
    async fn delete_row(&self, id: &RowId, kind: MutationKind) -> Result<DeleteOutcome, Error> {
        {
            let mut state = self.inner.state.lock().await;
            if !self.is_mounted() {
                return Ok(DeleteOutcome::Unmounted);
            }
            if kind == MutationKind::Delete && state.row(id).is_none() {
                log::debug!("Row {} is not cached; nothing to delete", id);
                return Ok(DeleteOutcome::NotPresent);
            }
            state.deletes.entry(id.clone()).or_default().begin(id, kind)?;
            self.publish(&state);
        }

        let result = self.bounded(self.inner.backend.delete(id)).await;

        let mut state = self.inner.state.lock().await;
        if !self.is_mounted() {
            return Ok(DeleteOutcome::Unmounted);
        }
        let succeeded = result.is_ok();
        if let Some(delete) = state.deletes.get_mut(id) {
            delete.finish(succeeded);
        }
        state.deletes.remove(id);

        match result {
            Ok(()) => {
                state.rows.retain(|r| r.id() != id);
                state.selection.remove([id]);
                state.edits.remove(id);
                self.publish(&state);
                Ok(DeleteOutcome::Removed)
            }
            Err(Error::Unmounted) => Ok(DeleteOutcome::Unmounted),
            Err(e) => {
                log::warn!("Delete of row {} failed: {}", id, e);
                self.publish(&state);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Validates and creates a row, then re-fetches the current page.
    pub async fn create(&self, fields: RowPatch) -> Result<CreateOutcome, Error> {
        {
            let mut state = self.inner.state.lock().await;
            if !self.is_mounted() {
                return Ok(CreateOutcome::Unmounted);
            }
            let errors = self.inner.config.schema.validate_new(&fields);
            if !errors.is_empty() {
                return Err(self.fail(&mut state, "Cannot create", Error::Validation(errors)));
            }
        }

        let mut body = fields;
        let now = Utc::now().to_rfc3339();
        body.insert(CREATED_AT_KEY, now.clone());
        body.insert(UPDATED_AT_KEY, now);
        if let Some(actor) = &self.inner.config.actor {
            let actor = serde_json::to_value(actor)?;
            body.insert(CREATED_BY_KEY, actor.clone());
            body.insert(UPDATED_BY_KEY, actor);
        }

        let created = match self.bounded(self.inner.backend.create(&body)).await {
            Ok(row) => row,
            Err(Error::Unmounted) => return Ok(CreateOutcome::Unmounted),
            Err(e) => {
                let mut state = self.inner.state.lock().await;
                return Err(self.fail(&mut state, "Failed to create", e));
            }
        };
        if !self.is_mounted() {
            return Ok(CreateOutcome::Unmounted);
        }

        self.reconcile().await;
        self.notify(Notice::success(format!("Created row {}", created.id())))
            .await;
        Ok(CreateOutcome::Created(created))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Runs a backend call under the timeout, giving up early on unmount.
    async fn bounded<T, F>(&self, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let timeout = self.inner.config.mutation_timeout;
        tokio::select! {
            _ = self.inner.cancel.cancelled() => Err(Error::Unmounted),
            result = tokio::time::timeout(timeout, call) => match result {
                Ok(result) => result.map_err(Error::from),
                Err(_) => Err(ApiError::Timeout(timeout).into()),
            },
        }
    }

    /// Surfaces an error as a notice and hands it back to the caller.
    fn fail(&self, state: &mut GridState, context: &str, error: Error) -> Error {
        log::warn!("{}: {}", context, error);
        state.notice = Some(Notice::error(format!("{}: {}", context, error.user_message())));
        self.publish(state);
        error
    }

    async fn notify(&self, notice: Notice) {
        let mut state = self.inner.state.lock().await;
        state.notice = Some(notice);
        self.publish(&state);
    }

    fn publish(&self, state: &GridState) {
        if self.is_mounted() {
            self.inner.view_tx.send_replace(state.view());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::query::Refinement;
    use crate::grid::MutationIntent;

    fn params_with(refinements: Vec<Refinement>) -> QueryParams {
        let spec = QuerySpec {
            filters: refinements
                .into_iter()
                .map(|r| (r.field, r.needle))
                .collect(),
            ..QuerySpec::default()
        };
        query::build(
            &spec,
            &PaginationMetadata::initial(10),
            &query::FilterPolicy::default(),
        )
    }

    fn metadata(items: u64) -> PaginationMetadata {
        PaginationMetadata {
            current_page: 1,
            page_size: 10,
            total_items: items,
            total_pages: 1,
            next_page: None,
            prev_page: None,
            first_page: 1,
            last_page: 1,
        }
    }

    #[test]
    fn test_apply_page_refines_and_closes_stale_forms() {
        let mut state = GridState::new(10);
        let gone = Row::new("gone");
        state.rows = vec![gone.clone()];
        state.edits.insert(RowId::from("gone"), EditState::Editing { original: gone });
        state.notice = Some(Notice::error("boom"));

        let page = Page::new(
            vec![
                Row::new("1").set("name", "Andrew"),
                Row::new("2").set("name", "Bob"),
            ],
            metadata(2),
        );
        let params = params_with(vec![Refinement {
            field: "name".into(),
            needle: "an".into(),
        }]);
        state.apply_page(page, &params);

        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.apparent_total, 1);
        assert_eq!(state.total_scope, TotalScope::PageLocal);
        assert!(state.edits.is_empty());
        assert!(state.notice.is_none());
        assert!(state.pagination.is_confirmed());
    }

    #[test]
    fn test_patch_needs_refetch() {
        let mut state = GridState::new(10);
        assert!(!state.patch_needs_refetch(&RowPatch::new().set("age", 3)));

        state.sort = Some(Sort::asc("age"));
        assert!(state.patch_needs_refetch(&RowPatch::new().set("age", 3)));

        state.filters.insert("role".into(), query::ALL.into());
        assert!(!state.patch_needs_refetch(&RowPatch::new().set("role", "admin")));

        state.filters.insert("role".into(), "user".into());
        assert!(state.patch_needs_refetch(&RowPatch::new().set("role", "admin")));
    }

    #[test]
    fn test_view_reports_row_status() {
        let mut state = GridState::new(10);
        let a = Row::new("a");
        state.rows = vec![a.clone(), Row::new("b"), Row::new("c")];
        state.edits.insert(RowId::from("a"), EditState::Editing { original: a });
        state.deletes.insert(
            RowId::from("b"),
            DeleteState::Deleting(MutationIntent::delete(RowId::from("b"), MutationKind::Delete)),
        );
        state.selection.toggle(&RowId::from("c"));

        let view = state.view();
        let statuses: Vec<_> = view.rows.iter().map(|r| (r.status, r.selected)).collect();
        assert_eq!(
            statuses,
            [
                (RowStatus::Editing, false),
                (RowStatus::Deleting, false),
                (RowStatus::Idle, true)
            ]
        );
    }
}
