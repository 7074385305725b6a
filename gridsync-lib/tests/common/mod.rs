//! In-memory backend for controller tests.
//!
//! Pages like json-server: `_page`/`_per_page`, exact-match filters on any
//! other parameter, `_sort` with a `-` prefix for descending.

#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use gridsync_lib::api::Backend;
use gridsync_lib::api::query::END_TIME_PARAM;
use gridsync_lib::api::query::PAGE_PARAM;
use gridsync_lib::api::query::PER_PAGE_PARAM;
use gridsync_lib::api::query::Page;
use gridsync_lib::api::query::PaginationMetadata;
use gridsync_lib::api::query::QueryParams;
use gridsync_lib::api::query::SORT_PARAM;
use gridsync_lib::api::query::START_TIME_PARAM;
use gridsync_lib::error::ApiError;
use gridsync_lib::model::Row;
use gridsync_lib::model::RowId;
use gridsync_lib::model::RowPatch;
use serde_json::Value;
use tokio::sync::Notify;

/// A recorded backend call.
#[derive(Debug, Clone)]
pub enum Call {
    Fetch(QueryParams),
    Create(RowPatch),
    Update(Row),
    Delete(RowId),
}

/// How `update` responds.
#[derive(Debug, Clone)]
pub enum UpdateMode {
    /// Store the row and echo it back.
    Echo,
    /// Store the row and send an empty body.
    Silent,
    /// Fail with the given status.
    Fail(u16),
    /// Wait for the notify, then echo.
    Gated(Arc<Notify>),
    /// Wait for the notify, then fail with 500.
    GatedFail(Arc<Notify>),
    /// Never answer.
    Hang,
}

pub struct FakeBackend {
    rows: Mutex<Vec<Row>>,
    page_gates: Mutex<HashMap<u32, Arc<Notify>>>,
    failing_deletes: Mutex<HashSet<RowId>>,
    hanging_deletes: Mutex<HashSet<RowId>>,
    fail_next_fetch: Mutex<bool>,
    update_mode: Mutex<UpdateMode>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u32>,
}

impl FakeBackend {
    pub fn new(rows: Vec<Row>) -> Arc<Self> {
        Arc::new(Self {
            next_id: Mutex::new(rows.len() as u32 + 1),
            rows: Mutex::new(rows),
            page_gates: Mutex::new(HashMap::new()),
            failing_deletes: Mutex::new(HashSet::new()),
            hanging_deletes: Mutex::new(HashSet::new()),
            fail_next_fetch: Mutex::new(false),
            update_mode: Mutex::new(UpdateMode::Echo),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Rows `u1..=uN` named after `names`.
    pub fn with_names(names: &[&str]) -> Arc<Self> {
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Row::new(format!("u{}", i + 1))
                    .set("name", *name)
                    .set("email", format!("{}@example.com", name.to_lowercase()))
                    .set("role", "user")
            })
            .collect();
        Self::new(rows)
    }

    /// Rows with the given ids.
    pub fn with_ids(ids: &[&str]) -> Arc<Self> {
        Self::new(
            ids.iter()
                .map(|id| Row::new(*id).set("name", format!("Row {}", id)))
                .collect(),
        )
    }

    /// Holds the next fetch of `page` until the returned notify fires.
    pub fn gate_page(&self, page: u32) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.page_gates.lock().unwrap().insert(page, gate.clone());
        gate
    }

    pub fn fail_delete(&self, id: &str) {
        self.failing_deletes.lock().unwrap().insert(RowId::from(id));
    }

    /// Deletes of `id` never answer.
    pub fn hang_delete(&self, id: &str) {
        self.hanging_deletes.lock().unwrap().insert(RowId::from(id));
    }

    /// The next fetch fails with 503.
    pub fn fail_next_fetch(&self) {
        *self.fail_next_fetch.lock().unwrap() = true;
    }

    /// Replaces a stored row, as another client would.
    pub fn put(&self, row: Row) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(slot) = rows.iter_mut().find(|r| r.id() == row.id()) {
            *slot = row;
        }
    }

    pub fn set_update_mode(&self, mode: UpdateMode) {
        *self.update_mode.lock().unwrap() = mode;
    }

    pub fn stored_ids(&self) -> Vec<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    pub fn stored(&self, id: &str) -> Option<Row> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id().as_str() == id)
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<QueryParams> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fetch(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches().len()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    /// Yields until at least `n` calls match.
    pub async fn wait_for(&self, n: usize, matches: impl Fn(&Call) -> bool) {
        while self.count(&matches) < n {
            tokio::task::yield_now().await;
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn field_text(row: &Row, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_page(&self, params: &QueryParams) -> Result<Page, ApiError> {
        self.record(Call::Fetch(params.clone()));

        if std::mem::take(&mut *self.fail_next_fetch.lock().unwrap()) {
            return Err(ApiError::server(503, "unavailable"));
        }

        let gate = self.page_gates.lock().unwrap().remove(&params.page());
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut rows: Vec<Row> = self.rows.lock().unwrap().clone();
        for (key, value) in params.iter() {
            if [PAGE_PARAM, PER_PAGE_PARAM, SORT_PARAM, START_TIME_PARAM, END_TIME_PARAM]
                .contains(&key)
            {
                continue;
            }
            rows.retain(|r| field_text(r, key).as_deref() == Some(value));
        }
        if let Some(sort) = params.get(SORT_PARAM) {
            let (field, desc) = match sort.strip_prefix('-') {
                Some(field) => (field, true),
                None => (sort, false),
            };
            rows.sort_by_key(|r| field_text(r, field));
            if desc {
                rows.reverse();
            }
        }

        let page = params.page();
        let size = params.page_size();
        let total_items = rows.len() as u64;
        let total_pages = total_items.div_ceil(u64::from(size)) as u32;
        let data: Vec<Row> = rows
            .into_iter()
            .skip(((page - 1) * size) as usize)
            .take(size as usize)
            .collect();

        Ok(Page::new(
            data,
            PaginationMetadata {
                current_page: page,
                page_size: size,
                total_items,
                total_pages,
                next_page: (page < total_pages).then_some(page + 1),
                prev_page: (page > 1).then_some(page - 1),
                first_page: 1,
                last_page: total_pages.max(1),
            },
        ))
    }

    async fn create(&self, fields: &RowPatch) -> Result<Row, ApiError> {
        self.record(Call::Create(fields.clone()));

        let id = {
            let mut next = self.next_id.lock().unwrap();
            let id = format!("u{}", *next);
            *next += 1;
            id
        };
        let mut json = fields.to_json();
        if let Value::Object(map) = &mut json {
            map.insert("id".into(), Value::String(id));
        }
        let row = Row::from_json(json).map_err(|e| ApiError::malformed(e.to_string()))?;
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, row: &Row) -> Result<Option<Row>, ApiError> {
        self.record(Call::Update(row.clone()));

        let mode = self.update_mode.lock().unwrap().clone();
        match &mode {
            UpdateMode::Fail(status) => return Err(ApiError::server(*status, "update rejected")),
            UpdateMode::Hang => std::future::pending::<()>().await,
            UpdateMode::Gated(gate) => gate.notified().await,
            UpdateMode::GatedFail(gate) => {
                gate.notified().await;
                return Err(ApiError::server(500, "update rejected"));
            }
            UpdateMode::Echo | UpdateMode::Silent => {}
        }

        let mut rows = self.rows.lock().unwrap();
        let Some(slot) = rows.iter_mut().find(|r| r.id() == row.id()) else {
            return Err(ApiError::server(404, "not found"));
        };
        *slot = row.clone();

        match mode {
            UpdateMode::Silent => Ok(None),
            _ => Ok(Some(row.clone())),
        }
    }

    async fn delete(&self, id: &RowId) -> Result<(), ApiError> {
        self.record(Call::Delete(id.clone()));

        if self.hanging_deletes.lock().unwrap().contains(id) {
            std::future::pending::<()>().await;
        }
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(ApiError::server(500, format!("cannot delete {}", id)));
        }
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        if rows.len() == before {
            return Err(ApiError::server(404, "not found"));
        }
        Ok(())
    }
}
