//! Provenance references

use serde::Deserialize;
use serde::Serialize;

/// The identity that created or last updated a row.
///
/// Serialized as `{"_id": "...", "email": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The actor's identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// The actor's email address.
    #[serde(default)]
    pub email: String,
}

impl Actor {
    /// Creates a new actor reference.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}
