//! Custom serialization for Row.
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "id": "u1",
//!   "name": "Hannah",
//!   "createdAt": "2024-05-01T10:00:00Z",
//!   "updatedAt": "2024-05-02T08:30:00Z",
//!   "createdBy": {"_id": "admin1", "email": "admin1@example.com"},
//!   "updatedBy": {"_id": "admin1", "email": "admin1@example.com"}
//! }
//! ```
//!
//! - `id` is preferred; `_id` is accepted when `id` is absent.
//! - Numeric ids are kept in their string form.
//! - Timestamps that are missing, null or unparseable decode as `None`.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;
use serde_json::Map;
use serde_json::Value;

use super::Actor;
use super::Row;
use super::RowId;
use super::row::CREATED_AT_KEY;
use super::row::CREATED_BY_KEY;
use super::row::ID_KEY;
use super::row::LEGACY_ID_KEY;
use super::row::UPDATED_AT_KEY;
use super::row::UPDATED_BY_KEY;
use crate::error::FieldError;
use crate::error::json_type_name;

// =============================================================================
// Serialization (for writes)
// =============================================================================

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(ID_KEY, self.id.as_str())?;

        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }

        if let Some(at) = self.created_at {
            map.serialize_entry(CREATED_AT_KEY, &at.to_rfc3339())?;
        }
        if let Some(at) = self.updated_at {
            map.serialize_entry(UPDATED_AT_KEY, &at.to_rfc3339())?;
        }
        if let Some(actor) = &self.created_by {
            map.serialize_entry(CREATED_BY_KEY, actor)?;
        }
        if let Some(actor) = &self.updated_by {
            map.serialize_entry(UPDATED_BY_KEY, actor)?;
        }

        map.end()
    }
}

// =============================================================================
// Deserialization (from reads)
// =============================================================================

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Row::from_json_map(map).map_err(serde::de::Error::custom)
    }
}

impl Row {
    /// Builds a row from a decoded JSON object.
    pub fn from_json_map(mut map: Map<String, Value>) -> Result<Row, FieldError> {
        let id = match map.remove(ID_KEY) {
            Some(Value::Null) | None => map.remove(LEGACY_ID_KEY),
            Some(id) => {
                map.remove(LEGACY_ID_KEY);
                Some(id)
            }
        };
        let id = match id {
            Some(Value::String(s)) if !s.is_empty() => RowId::new(s),
            Some(Value::Number(n)) => RowId::new(n.to_string()),
            Some(Value::String(_)) | None => return Err(FieldError::missing(ID_KEY)),
            Some(other) => {
                return Err(FieldError::type_mismatch(ID_KEY, "string", json_type_name(&other)));
            }
        };

        let mut row = Row::new(id);
        row.created_at = take_timestamp(&mut map, CREATED_AT_KEY, &row.id);
        row.updated_at = take_timestamp(&mut map, UPDATED_AT_KEY, &row.id);
        row.created_by = take_actor(&mut map, CREATED_BY_KEY)?;
        row.updated_by = take_actor(&mut map, UPDATED_BY_KEY)?;
        row.fields = map.into_iter().collect();

        Ok(row)
    }

    /// Builds a row from any JSON value.
    pub fn from_json(value: Value) -> Result<Row, FieldError> {
        match value {
            Value::Object(map) => Row::from_json_map(map),
            other => Err(FieldError::type_mismatch("row", "object", json_type_name(&other))),
        }
    }
}

fn take_timestamp(map: &mut Map<String, Value>, key: &str, id: &RowId) -> Option<DateTime<Utc>> {
    match map.remove(key)? {
        Value::String(s) => match DateTime::parse_from_rfc3339(&s) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(_) => {
                log::warn!("row {}: invalid {} timestamp {:?}", id, key, s);
                None
            }
        },
        Value::Null => None,
        other => {
            log::warn!("row {}: {} is a {}, not a timestamp", id, key, json_type_name(&other));
            None
        }
    }
}

fn take_actor(map: &mut Map<String, Value>, key: &str) -> Result<Option<Actor>, FieldError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map(Some)
            .map_err(|_| FieldError::type_mismatch(key, "actor", "object")),
        Some(other) => Err(FieldError::type_mismatch(key, "actor", json_type_name(&other))),
    }
}
