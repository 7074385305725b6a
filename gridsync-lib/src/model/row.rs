//! Grid row

use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;

use super::Actor;
use super::RowPatch;
use crate::error::FieldError;
use crate::error::json_type_name;

/// Keys the server manages; they never appear in [`Row::fields`].
pub const ID_KEY: &str = "id";
pub const LEGACY_ID_KEY: &str = "_id";
pub const CREATED_AT_KEY: &str = "createdAt";
pub const UPDATED_AT_KEY: &str = "updatedAt";
pub const CREATED_BY_KEY: &str = "createdBy";
pub const UPDATED_BY_KEY: &str = "updatedBy";

/// Returns `true` for keys that are split out of the column map.
pub fn is_managed_key(key: &str) -> bool {
    matches!(
        key,
        ID_KEY | LEGACY_ID_KEY | CREATED_AT_KEY | UPDATED_AT_KEY | CREATED_BY_KEY | UPDATED_BY_KEY
    )
}

/// Stable identifier of a row.
///
/// Backends may send ids as strings or numbers; both are kept as their string
/// form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(String);

impl RowId {
    /// Creates a row id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One record of the managed collection.
///
/// The grid holds a cached copy of each row on the current page; the backend
/// stays the source of truth.
///
/// # Example
///
/// ```
/// use gridsync_lib::model::Row;
///
/// let row = Row::new("u1")
///     .set("name", "Hannah")
///     .set("age", 31);
///
/// assert_eq!(row.get_string("name").unwrap(), Some("Hannah"));
/// assert_eq!(row.get_i64("age").unwrap(), Some(31));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub(crate) id: RowId,
    pub(crate) fields: BTreeMap<String, Value>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
    pub(crate) created_by: Option<Actor>,
    pub(crate) updated_by: Option<Actor>,
}

impl Row {
    /// Creates an empty row with the given id.
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
            created_at: None,
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    // =========================================================================
    // Metadata accessors
    // =========================================================================

    /// Returns the row id.
    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// When the row was created, if the backend reported a valid timestamp.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// When the row was last updated, if the backend reported a valid timestamp.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Who created the row.
    pub fn created_by(&self) -> Option<&Actor> {
        self.created_by.as_ref()
    }

    /// Who last updated the row.
    pub fn updated_by(&self) -> Option<&Actor> {
        self.updated_by.as_ref()
    }

    /// Sets the creation timestamp (builder pattern).
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Sets the update timestamp (builder pattern).
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Sets the creating actor (builder pattern).
    pub fn with_created_by(mut self, actor: Actor) -> Self {
        self.created_by = Some(actor);
        self
    }

    /// Sets the updating actor (builder pattern).
    pub fn with_updated_by(mut self, actor: Actor) -> Self {
        self.updated_by = Some(actor);
        self
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the column value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the row contains the given column.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all columns.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Sets a column value (builder pattern).
    ///
    /// Managed keys (`id`, timestamps, provenance) are ignored here; use the
    /// `with_*` setters instead.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts a column value. Managed keys are ignored.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        if !is_managed_key(&field) {
            self.fields.insert(field, value.into());
        }
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is null.
    // =========================================================================

    /// Gets a string column value.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(field, "string", json_type_name(other))),
        }
    }

    /// Gets an integer column value.
    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| FieldError::type_mismatch(field, "integer", "number")),
            Some(other) => Err(FieldError::type_mismatch(field, "integer", json_type_name(other))),
        }
    }

    /// Returns the column rendered as text, for substring matching.
    ///
    /// Strings are returned as-is and numbers in their decimal form; other
    /// types have no text form.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Merges submitted fields into the row and bumps `updatedAt`.
    ///
    /// `updatedAt` never moves backwards: if the stored timestamp is ahead of
    /// `now` it is kept.
    pub fn apply_patch(&mut self, patch: &RowPatch, now: DateTime<Utc>) {
        for (field, value) in patch.iter() {
            self.insert(field.clone(), value.clone());
        }
        self.touch(now);
    }

    /// Sets `updatedAt` to `at` unless the row already carries a later one.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(match self.updated_at {
            Some(current) if current > at => current,
            _ => at,
        });
    }
}
