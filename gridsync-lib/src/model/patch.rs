//! Field patches for edit and create

use std::collections::BTreeMap;

use serde_json::Value;

/// A set of column values submitted by the operator.
///
/// Used both as the payload of an inline edit and as the field set of a new
/// row. Keys are column names; values are raw JSON values.
///
/// # Example
///
/// ```
/// use gridsync_lib::model::RowPatch;
///
/// let patch = RowPatch::new()
///     .set("name", "Hannah")
///     .set("age", 31);
///
/// assert!(patch.touches("name"));
/// assert!(!patch.touches("email"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPatch {
    fields: BTreeMap<String, Value>,
}

impl RowPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns the submitted value for a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the patch sets the given field.
    pub fn touches(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates over the submitted fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Returns `true` if the patch sets no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields in the patch.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Converts the patch into a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone().into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for RowPatch {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
